use std::collections::HashMap;

use crate::data::model::CarRecord;

/// Word frequencies over the specs of rows no extractor has matched yet,
/// most frequent first, ties broken alphabetically. A maintenance aid for
/// finding the next rule worth adding.
pub fn unmatched_word_counts(records: &[CarRecord], top_n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| !r.has_keyword) {
        for word in record.specs.split_whitespace() {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(word, n)| (word.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(top_n);
    counts
}
