// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Include/exclude projection of a record's key set.
//!
//! Patterns are regular expressions anchored at the start of the key, so
//! `link` selects `link__num` but `num` does not. Exclusion wins over
//! inclusion; an empty include list retains every key not excluded.

use regex::Regex;

use crate::errors::ConfigError;
use crate::record::Record;

#[derive(Debug)]
pub struct FieldFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl FieldFilter {
    /// Build a filter from comma-separated pattern lists.
    ///
    /// Empty entries are dropped, so `""` means "no patterns" for either
    /// list: retain everything, exclude nothing.
    pub fn new(include: &str, exclude: &str) -> Result<Self, ConfigError> {
        Ok(FieldFilter {
            include: compile_list(include)?,
            exclude: compile_list(exclude)?,
        })
    }

    /// Project a record through the filter. Applying the same filter twice
    /// yields the same record.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Record {
        record
            .iter()
            .filter(|(key, _)| self.retains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn retains(&self, key: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(key)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(key))
    }
}

fn compile_list(patterns: &str) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            // Anchor at the start of the key; a bare prefix is enough to match.
            Regex::new(&format!("^(?:{pattern})")).map_err(|source| ConfigError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
