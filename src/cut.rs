//! Field selection over delimited text lines
//!
//! This is the transform the worker service applies to every shard. It is a
//! pure, shard-local function: each line is processed independently, so any
//! contiguous slice of the input can be cut on any worker.
//!
//! # Field lists
//!
//! Fields are numbered from 1 and given as a comma-separated list of single
//! fields and closed ranges:
//!
//! ```
//! use quorumcut::cut::parse_fields;
//!
//! assert_eq!(parse_fields("3,1-2,2").unwrap(), vec![1, 2, 3]);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default delimiter (matches `cut(1)`)
pub const DEFAULT_DELIMITER: &str = "\t";

/// Highest field number accepted in a field list
pub const MAX_FIELD: usize = 1 << 16;

/// Errors produced while building [`CutArgs`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutArgsError {
    #[error("the delimiter must be a single character")]
    BadDelimiter,

    #[error("you must specify fields")]
    NoFields,

    #[error("invalid field value: {0}")]
    InvalidFieldValue(String),

    #[error("invalid decreasing range: {0}")]
    DecreasingRange(String),

    #[error("invalid field range: {0}")]
    InvalidFieldRange(String),

    #[error("invalid range with no endpoint: {0}")]
    RangeWithoutEndpoint(String),

    #[error("fields are numbered from 1")]
    FieldsNumberedFrom,

    #[error("field number {0} is too large")]
    FieldTooLarge(String),

    #[error("field list must be sorted and unique")]
    UnorderedFields,
}

/// Parameters shared by every shard of one cut invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutArgs {
    /// Selected fields, 1-based, sorted and unique
    pub fields: Vec<usize>,

    /// Field delimiter (exactly one character)
    pub delimiter: String,

    /// Drop lines that contain no delimiter
    pub separated: bool,
}

impl CutArgs {
    /// Build arguments from a field list, a delimiter and the separated-only flag
    pub fn new(fields: &str, delimiter: &str, separated: bool) -> Result<Self, CutArgsError> {
        if delimiter.chars().count() != 1 {
            return Err(CutArgsError::BadDelimiter);
        }

        Ok(Self {
            fields: parse_fields(fields)?,
            delimiter: delimiter.to_string(),
            separated,
        })
    }

    /// Check arguments that did not come through [`CutArgs::new`]
    pub fn validate(&self) -> Result<(), CutArgsError> {
        if self.delimiter.chars().count() != 1 {
            return Err(CutArgsError::BadDelimiter);
        }

        let (first, last) = match (self.fields.first(), self.fields.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(CutArgsError::NoFields),
        };

        if first < 1 {
            return Err(CutArgsError::FieldsNumberedFrom);
        }
        if last > MAX_FIELD {
            return Err(CutArgsError::FieldTooLarge(last.to_string()));
        }
        if self.fields.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CutArgsError::UnorderedFields);
        }

        Ok(())
    }

    /// Cut a single line
    ///
    /// Returns `None` when the line is suppressed (`separated` is set and the
    /// line has no delimiter). Selection stops at the first field past the end
    /// of the line.
    pub fn cut_line(&self, line: &str) -> Option<String> {
        let parts: Vec<&str> = line.split(self.delimiter.as_str()).collect();

        if self.separated && parts.len() < 2 {
            return None;
        }

        let selected: Vec<&str> = self
            .fields
            .iter()
            .take_while(|&&field| field <= parts.len())
            .map(|&field| parts[field - 1])
            .collect();

        Some(selected.join(&self.delimiter))
    }

    /// Cut every record of a shard, keeping their relative order
    pub fn cut_records(&self, records: &[String]) -> Vec<String> {
        records.iter().filter_map(|line| self.cut_line(line)).collect()
    }
}

/// Parse a field list such as `1,3-5`
pub fn parse_fields(list: &str) -> Result<Vec<usize>, CutArgsError> {
    if list.is_empty() {
        return Err(CutArgsError::NoFields);
    }

    let mut fields = Vec::new();

    for item in list.split(',') {
        let bounds: Vec<&str> = item.split('-').collect();

        match bounds.as_slice() {
            [single] => {
                let field = parse_field(single)?;
                fields.push(field);
            }
            [first, second] => {
                if first.is_empty() || second.is_empty() {
                    return Err(CutArgsError::RangeWithoutEndpoint(item.to_string()));
                }

                let first = parse_field(first)?;
                let second = parse_field(second)?;
                if second < first {
                    return Err(CutArgsError::DecreasingRange(item.to_string()));
                }

                fields.extend(first..=second);
            }
            _ => return Err(CutArgsError::InvalidFieldRange(item.to_string())),
        }
    }

    fields.sort_unstable();
    fields.dedup();

    Ok(fields)
}

fn parse_field(raw: &str) -> Result<usize, CutArgsError> {
    let field: usize = raw
        .trim()
        .parse()
        .map_err(|_| CutArgsError::InvalidFieldValue(raw.to_string()))?;

    if field < 1 {
        return Err(CutArgsError::FieldsNumberedFrom);
    }
    if field > MAX_FIELD {
        return Err(CutArgsError::FieldTooLarge(raw.to_string()));
    }

    Ok(field)
}
