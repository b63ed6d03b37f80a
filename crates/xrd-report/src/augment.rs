// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Site-specific record augmentation.
//!
//! Deployments often want derived tags the protocol does not carry: a
//! `host_type` inferred from the host name, an instance renamed for one
//! specific host/port pair. None of that belongs in the generic pipeline, so
//! it hangs off the [`Augment`] trait and the shipped implementation is
//! driven entirely by configured [`SiteRule`]s.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::record::{to_numeric, Record};

/// Post-filter augmentation step.
///
/// Implementations must be pure: the input record is never mutated and the
/// only effect is the returned record, so concurrent pipeline invocations
/// cannot interfere.
pub trait Augment: Send + Sync {
    fn augment(&self, record: &Record) -> Record;
}

/// One configured rule: inspect a key's value, and on a match insert (or
/// overwrite) a set of entries.
#[derive(Clone, Debug, Deserialize)]
pub struct SiteRule {
    /// Key whose value is inspected.
    pub field: String,
    /// Substring the value must contain.
    #[serde(default)]
    pub contains: Option<String>,
    /// Exact value the key must hold.
    #[serde(default)]
    pub equals: Option<String>,
    /// Entries inserted when the rule matches. Values go through the usual
    /// numeric coercion.
    pub set: IndexMap<String, String>,
}

impl SiteRule {
    fn matches(&self, record: &Record) -> bool {
        if self.contains.is_none() && self.equals.is_none() {
            return false;
        }
        let Some(value) = record.get(&self.field) else {
            return false;
        };
        let text = value.to_string();
        if let Some(needle) = &self.contains {
            if !text.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(expected) = &self.equals {
            if text != *expected {
                return false;
            }
        }
        true
    }
}

/// Rule-driven [`Augment`] implementation. Rules apply in order; later rules
/// see the original record, not each other's insertions.
#[derive(Debug, Default)]
pub struct SiteAugmenter {
    rules: Vec<SiteRule>,
}

impl SiteAugmenter {
    #[must_use]
    pub fn new(rules: Vec<SiteRule>) -> Self {
        SiteAugmenter { rules }
    }
}

impl Augment for SiteAugmenter {
    fn augment(&self, record: &Record) -> Record {
        let mut augmented = record.clone();
        for rule in &self.rules {
            if rule.matches(record) {
                for (key, raw) in &rule.set {
                    augmented.insert(key.clone(), to_numeric(raw));
                }
            }
        }
        augmented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    fn rule(field: &str, contains: Option<&str>, equals: Option<&str>, set: &[(&str, &str)]) -> SiteRule {
        SiteRule {
            field: field.to_string(),
            contains: contains.map(str::to_string),
            equals: equals.map(str::to_string),
            set: set
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn sample() -> Record {
        let mut record = Record::new();
        record.insert(
            "info__host".to_string(),
            Value::Str("ceph-gw3.example.org".to_string()),
        );
        record.insert("info__port".to_string(), Value::Int(1094));
        record.insert("ins".to_string(), Value::Str("anon".to_string()));
        record
    }

    #[test]
    fn test_contains_rule_derives_tag() {
        let augmenter = SiteAugmenter::new(vec![rule(
            "info__host",
            Some("-gw"),
            None,
            &[("host_type", "gateway")],
        )]);
        let augmented = augmenter.augment(&sample());
        assert_eq!(
            augmented["host_type"],
            Value::Str("gateway".to_string())
        );
    }

    #[test]
    fn test_equals_rule_renames_instance() {
        let augmenter = SiteAugmenter::new(vec![rule(
            "info__port",
            None,
            Some("1094"),
            &[("ins", "frontend")],
        )]);
        let augmented = augmenter.augment(&sample());
        assert_eq!(augmented["ins"], Value::Str("frontend".to_string()));
    }

    #[test]
    fn test_input_record_is_untouched() {
        let record = sample();
        let augmenter = SiteAugmenter::new(vec![rule(
            "info__host",
            Some("ceph"),
            None,
            &[("host_type", "disk")],
        )]);
        let _ = augmenter.augment(&record);
        assert!(!record.contains_key("host_type"));
    }

    #[test]
    fn test_rule_without_condition_never_fires() {
        let augmenter =
            SiteAugmenter::new(vec![rule("info__host", None, None, &[("host_type", "x")])]);
        let augmented = augmenter.augment(&sample());
        assert!(!augmented.contains_key("host_type"));
    }

    #[test]
    fn test_missing_field_never_fires() {
        let augmenter = SiteAugmenter::new(vec![rule(
            "absent",
            Some("x"),
            None,
            &[("host_type", "x")],
        )]);
        let augmented = augmenter.augment(&sample());
        assert_eq!(augmented, sample());
    }
}
