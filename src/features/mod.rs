//! Feature mining over the free-text `specs` column.
//!
//! Each feature is an ordered [`RuleChain`]: a broad regex runs first, then
//! narrower rules correct its known failure modes by overwriting its result
//! for the rows they match.

pub mod keywords;
pub mod rules;

pub use keywords::unmatched_word_counts;
pub use rules::{Rule, RuleChain};

use crate::data::model::CarRecord;

/// Boost PSI and fuel octane mined from one specs string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpecFeatures {
    pub psi: Option<f64>,
    pub octane: Option<i32>,
}

impl SpecFeatures {
    pub fn has_keyword(&self) -> bool {
        self.psi.is_some() || self.octane.is_some()
    }
}

/// Boost pressure: any number in front of "psi", then the
/// `"17.5 Peak PSI"` phrasing, which the broad pattern misses.
pub fn psi_rules() -> RuleChain<f64> {
    RuleChain::new()
        .then(Rule::capture(
            "psi",
            r"(?i)^.*(?:^|\s)(\d+\.*\d*)\s?psi.*$",
        ))
        .then(Rule::capture("peak_psi", r"^.*\b(\d{1,2}\.\d) Peak PSI"))
}

/// Fuel octane. E85 is bucketed as 105.
pub fn octane_rules() -> RuleChain<i32> {
    RuleChain::new()
        .then(Rule::capture("octane", r"^.*\b(\d+)[,\s]?\s?(?i:oct).*$"))
        .then(Rule::contains("93", &[" 93 "], 93))
        .then(Rule::contains(
            "91",
            &["ACN91", "ANC91", "91 CA", " 91 "],
            91,
        ))
        .then(Rule::contains("104", &["104"], 104))
        .then(Rule::contains("e85", &["E85", "E-85"], 105))
        .then(Rule::contains("ms109", &["MS109"], 109))
}

/// Adds `psi`, `octane` and `has_keyword` to cleaned car records.
#[derive(Debug, Clone)]
pub struct SpecFeatureExtractor {
    psi: RuleChain<f64>,
    octane: RuleChain<i32>,
}

impl Default for SpecFeatureExtractor {
    fn default() -> Self {
        Self::new(psi_rules(), octane_rules())
    }
}

impl SpecFeatureExtractor {
    pub fn new(psi: RuleChain<f64>, octane: RuleChain<i32>) -> Self {
        Self { psi, octane }
    }

    pub fn extract(&self, specs: &str) -> SpecFeatures {
        SpecFeatures {
            psi: self.psi.evaluate(specs),
            octane: self.octane.evaluate(specs),
        }
    }

    pub fn apply(&self, records: Vec<CarRecord>) -> Vec<CarRecord> {
        let records: Vec<CarRecord> = records
            .into_iter()
            .map(|record| {
                let features = self.extract(&record.specs);
                CarRecord {
                    has_keyword: record.has_keyword || features.has_keyword(),
                    psi: features.psi,
                    octane: features.octane,
                    ..record
                }
            })
            .collect();

        let matched = records.iter().filter(|r| r.has_keyword).count();
        log::info!(
            "spec features: {matched} of {} rows matched a keyword",
            records.len()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(run: i64, specs: &str) -> CarRecord {
        CarRecord {
            run,
            name: String::new(),
            specs: specs.to_string(),
            car_year: None,
            car_make: None,
            car_model: None,
            has_keyword: false,
            psi: None,
            octane: None,
        }
    }

    #[test]
    fn test_psi_general_rule() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("Stage 2, 22 psi on pump gas").psi, Some(22.0));
        assert_eq!(ex.extract("Stage 2, 19.5PSI").psi, Some(19.5));
        assert_eq!(ex.extract("18 Psi").psi, Some(18.0));
    }

    #[test]
    fn test_psi_takes_last_number_before_psi() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("was 14 psi now 21 psi").psi, Some(21.0));
    }

    #[test]
    fn test_peak_psi_overrides_general_rule() {
        let ex = SpecFeatureExtractor::default();
        let features = ex.extract("Wastegate 45 psi spring, 17.5 Peak PSI");
        assert_eq!(features.psi, Some(17.5));
    }

    #[test]
    fn test_peak_psi_takes_last_phrase() {
        let ex = SpecFeatureExtractor::default();
        let specs = "9.5 Peak PSI on pump, 17.5 Peak PSI on E85";
        assert_eq!(ex.extract(specs).psi, Some(17.5));
        assert_eq!(psi_rules().winning_rule(specs), Some("peak_psi"));
    }

    #[test]
    fn test_peak_psi_fills_a_null() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("boost: 9.5 Peak PSI").psi, Some(9.5));
        assert_eq!(psi_rules().winning_rule("boost: 9.5 Peak PSI"), Some("peak_psi"));
    }

    #[test]
    fn test_octane_general_rule() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("Tuned on 100 octane").octane, Some(100));
        assert_eq!(ex.extract("tune for 98oct").octane, Some(98));
        assert_eq!(ex.extract("tune for 95, Oct blend").octane, Some(95));
    }

    #[test]
    fn test_ms109_beats_general_octane() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("100 oct with a splash of MS109").octane, Some(109));
    }

    #[test]
    fn test_octane_fixed_rules() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("Stock turbo 93 pump").octane, Some(93));
        assert_eq!(ex.extract("Protune ACN91 fuel").octane, Some(91));
        assert_eq!(ex.extract("91 CA pump").octane, Some(91));
        assert_eq!(ex.extract("Sunoco 104 race").octane, Some(104));
        assert_eq!(ex.extract("E-85 flex").octane, Some(105));
    }

    #[test]
    fn test_e85_bucket() {
        let ex = SpecFeatureExtractor::default();
        let features = ex.extract("Tuned on E85");
        assert_eq!(features.octane, Some(105));
        assert_eq!(features.psi, None);
        assert!(features.has_keyword());
    }

    #[test]
    fn test_e85_overrides_93() {
        let ex = SpecFeatureExtractor::default();
        assert_eq!(ex.extract("Map for 93 and E85").octane, Some(105));
    }

    #[test]
    fn test_no_match() {
        let ex = SpecFeatureExtractor::default();
        let features = ex.extract("Stock tune, no mods");
        assert_eq!(features, SpecFeatures::default());
        assert!(!features.has_keyword());
    }

    #[test]
    fn test_apply_sets_columns() {
        let ex = SpecFeatureExtractor::default();
        let out = ex.apply(vec![
            record(1, "Stock tune, no mods"),
            record(2, "22 psi on E85"),
        ]);
        assert_eq!(out[0].psi, None);
        assert_eq!(out[0].octane, None);
        assert!(!out[0].has_keyword);
        assert_eq!(out[1].psi, Some(22.0));
        assert_eq!(out[1].octane, Some(105));
        assert!(out[1].has_keyword);
        assert_eq!(out[1].run, 2);
    }
}
