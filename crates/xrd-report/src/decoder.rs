// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoder for `xrd.report` summary payloads.
//!
//! A report is a small XML document: attributes on the document element carry
//! the report-wide identifiers (`src`, `tod`, `pgm`, ...), and each
//! `<stats id="...">` section carries the counters of one subsystem. The
//! decoder flattens the whole document into a [`Record`], namespacing nested
//! entries as `section__child` or `section__child__grandchild`.

use crate::errors::DecodeError;
use crate::record::{to_numeric, Record, Value};

const SECTION_TAG: &str = "stats";

/// The pfc reporter appends a stray trailing character to this counter.
const STRAY_SUFFIX_KEY: &str = "cache__rd__hits";

/// Decode one report payload into a flat record.
///
/// Decoding is deterministic: the same payload always yields the same record,
/// in the same insertion order. Structural problems (unparseable document,
/// section without an `id`, element without text) fail the whole payload.
pub fn decode(payload: &str) -> Result<Record, DecodeError> {
    let doc = roxmltree::Document::parse(payload)?;
    let root = doc.root_element();

    let mut record = Record::new();
    for attr in root.attributes() {
        record.insert(attr.name().to_string(), to_numeric(attr.value()));
    }

    for section in root.children().filter(|n| n.has_tag_name(SECTION_TAG)) {
        let id = section
            .attribute("id")
            .ok_or(DecodeError::MissingSectionId)?;
        for child in section.children().filter(|n| n.is_element()) {
            let nested: Vec<_> = child.children().filter(|n| n.is_element()).collect();
            if nested.is_empty() {
                let key = format!("{id}__{}", child.tag_name().name());
                let text = child
                    .text()
                    .ok_or_else(|| DecodeError::EmptyElement(key.clone()))?;
                let value = coerce(&key, text);
                record.insert(key, value);
            } else {
                for grandchild in nested {
                    let key = format!(
                        "{id}__{}__{}",
                        child.tag_name().name(),
                        grandchild.tag_name().name()
                    );
                    let text = grandchild
                        .text()
                        .ok_or_else(|| DecodeError::EmptyElement(key.clone()))?;
                    let value = coerce(&key, text);
                    record.insert(key, value);
                }
            }
        }
    }

    Ok(record)
}

/// Numeric coercion, with repair of the known-malformed counter.
fn coerce(key: &str, raw: &str) -> Value {
    if key == STRAY_SUFFIX_KEY {
        let numeric_run = leading_numeric_run(raw);
        if !numeric_run.is_empty() {
            return to_numeric(numeric_run);
        }
    }
    to_numeric(raw)
}

fn leading_numeric_run(raw: &str) -> &str {
    let end = raw
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(raw.len());
    &raw[..end]
}
