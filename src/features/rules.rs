use std::str::FromStr;

use regex::Regex;

use crate::error::{PrepError, PrepResult};

/// One step of an override chain.
#[derive(Debug, Clone)]
pub enum Rule<T> {
    /// Parse the first capture group of `pattern`. A capture that does not
    /// parse as `T` counts as no match.
    Capture { name: &'static str, pattern: Regex },
    /// Yield `value` when any of `needles` occurs verbatim in the text.
    Contains {
        name: &'static str,
        needles: &'static [&'static str],
        value: T,
    },
}

impl<T: FromStr + Copy> Rule<T> {
    /// Build a capture rule from a pattern that may be invalid.
    pub fn try_capture(name: &'static str, pattern: &str) -> PrepResult<Self> {
        let pattern = Regex::new(pattern).map_err(|source| PrepError::InvalidPattern {
            rule: name.to_string(),
            source,
        })?;
        Ok(Rule::Capture { name, pattern })
    }

    /// Build a capture rule from a built-in pattern. Panics if the pattern is
    /// invalid; use [`Rule::try_capture`] for patterns read at runtime.
    pub fn capture(name: &'static str, pattern: &str) -> Self {
        Self::try_capture(name, pattern).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn contains(name: &'static str, needles: &'static [&'static str], value: T) -> Self {
        Rule::Contains { name, needles, value }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Capture { name, .. } | Rule::Contains { name, .. } => name,
        }
    }

    pub fn apply(&self, text: &str) -> Option<T> {
        match self {
            Rule::Capture { pattern, .. } => pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            Rule::Contains { needles, value, .. } => needles
                .iter()
                .any(|needle| text.contains(needle))
                .then_some(*value),
        }
    }
}

/// Rules in increasing priority: a later rule that matches replaces whatever
/// the earlier ones produced.
#[derive(Debug, Clone)]
pub struct RuleChain<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleChain<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: FromStr + Copy> RuleChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule with higher priority than every rule already present.
    pub fn then(mut self, rule: Rule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn evaluate(&self, text: &str) -> Option<T> {
        self.rules
            .iter()
            .fold(None, |acc, rule| rule.apply(text).or(acc))
    }

    /// Name of the highest-priority rule matching `text`.
    pub fn winning_rule(&self, text: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .fold(None, |acc, rule| rule.apply(text).map(|_| rule.name()).or(acc))
    }
}
