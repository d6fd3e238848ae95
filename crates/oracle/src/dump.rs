//! Parser for the DUMP_ARRAYS diagnostic region emitted by kernel binaries.
//!
//! A verification binary writes a delimited region to stderr containing one
//! block per output array:
//!
//! ```text
//! ==BEGIN DUMP_ARRAYS==
//! begin dump: A
//! 1.0 2.0 3.0
//! end   dump: A
//! ==END   DUMP_ARRAYS==
//! ```
//!
//! The region sits inside arbitrary surrounding trace output, which the
//! parser ignores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Line marking the start of the diagnostic region.
pub const BEGIN_MARKER: &str = "==BEGIN DUMP_ARRAYS==";
/// Line marking the end of the diagnostic region.
pub const END_MARKER: &str = "==END   DUMP_ARRAYS==";
/// Token introducing one per-array block inside the region.
pub const BLOCK_PREFIX: &str = "begin dump: ";

/// Number of fixed-format trailer tokens closing each block (`end`, `dump:`,
/// and the repeated array name). Never data, never inferred.
const TRAILER_TOKENS: usize = 3;

/// Ways a capture can fail to yield a usable array dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    #[error("no DUMP_ARRAYS region found in capture")]
    RegionNotFound,

    #[error("array `{name}` is not closed by its own name (trailing token `{trailing}`)")]
    IntegrityViolation { name: String, trailing: String },

    #[error("array `{name}` is declared more than once in the same dump")]
    DuplicateArray { name: String },

    #[error("array `{name}` contains non-numeric value token `{token}`")]
    BadValue { name: String, token: String },
}

/// Mapping from array name to its ordered values, as reconstructed from one
/// capture. Immutable once parsed; value order is significant, name order is
/// not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedArraySet(BTreeMap<String, Vec<f64>>);

impl NamedArraySet {
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<f64>)> for NamedArraySet {
    fn from_iter<T: IntoIterator<Item = (String, Vec<f64>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Extract the [`NamedArraySet`] from one raw capture.
///
/// Any failure aborts the whole parse; a partially parsed dump is never
/// returned.
pub fn parse_dump(raw: &str) -> Result<NamedArraySet, DumpError> {
    let region = locate_region(raw)?;

    let mut arrays = BTreeMap::new();
    for block in region.split(BLOCK_PREFIX) {
        let tokens: Vec<&str> = block.split_whitespace().collect();
        let Some(&name) = tokens.first() else {
            // Leading fragment before the first block, or stray whitespace.
            continue;
        };
        let trailing = tokens[tokens.len() - 1];
        if trailing != name {
            return Err(DumpError::IntegrityViolation {
                name: name.to_string(),
                trailing: trailing.to_string(),
            });
        }

        let data_end = tokens.len().saturating_sub(TRAILER_TOKENS).max(1);
        let mut values = Vec::with_capacity(data_end - 1);
        for token in &tokens[1..data_end] {
            let value: f64 = token.parse().map_err(|_| DumpError::BadValue {
                name: name.to_string(),
                token: token.to_string(),
            })?;
            values.push(value);
        }

        if arrays.insert(name.to_string(), values).is_some() {
            return Err(DumpError::DuplicateArray {
                name: name.to_string(),
            });
        }
    }
    Ok(NamedArraySet(arrays))
}

fn locate_region(raw: &str) -> Result<&str, DumpError> {
    let begin = raw.find(BEGIN_MARKER).ok_or(DumpError::RegionNotFound)?;
    let body = &raw[begin + BEGIN_MARKER.len()..];
    let end = body.find(END_MARKER).ok_or(DumpError::RegionNotFound)?;
    Ok(&body[..end])
}

/// Render a [`NamedArraySet`] in the dump grammar, markers included.
///
/// Parsing the result reproduces the set exactly; used to synthesize captures
/// for fixtures.
pub fn format_dump(arrays: &NamedArraySet) -> String {
    let mut out = String::new();
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    for (name, values) in arrays.iter() {
        out.push_str(BLOCK_PREFIX);
        out.push_str(name);
        out.push('\n');
        for value in values {
            out.push_str(&format!("{value} "));
        }
        out.push('\n');
        out.push_str(&format!("end   dump: {name}\n"));
    }
    out.push_str(END_MARKER);
    out.push('\n');
    out
}
