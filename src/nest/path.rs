//! Compiled paths and their textual form
//!
//! A path such as `[userId].toys.[toyId].toyName` is held as typed segments;
//! bracketed segments are identity placeholders resolved per row.

use crate::error::{NestError, Result};
use crate::nest::types::Separator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static IDENTITY_SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\[\]]+)\]$").unwrap());

/// One step of a compiled path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A fixed container key or the final field name
    Literal(String),
    /// Replaced by the row's value of this column
    Identity(String),
}

impl Segment {
    pub fn name(&self) -> &str {
        match self {
            Segment::Literal(name) | Segment::Identity(name) => name,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Segment::Identity(_))
    }

    fn parse(token: &str) -> Option<Self> {
        if let Some(captures) = IDENTITY_SEGMENT_REGEX.captures(token) {
            return Some(Segment::Identity(captures[1].to_string()));
        }

        if token.is_empty() || token.contains('[') || token.contains(']') {
            return None;
        }

        Some(Segment::Literal(token.to_string()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(name) => f.write_str(name),
            Segment::Identity(column) => write!(f, "[{}]", column),
        }
    }
}

/// Route from the result root to one leaf field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledPath {
    segments: Vec<Segment>,
}

impl CompiledPath {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        CompiledPath { segments }
    }

    /// Parse a rendered path; `column` is only used in error messages
    pub fn parse(path: &str, separator: &Separator, column: &str) -> Result<Self> {
        let invalid = |reason| NestError::InvalidPath {
            column: column.to_string(),
            path: path.to_string(),
            reason,
        };

        let segments = path
            .split(separator.as_str())
            .map(|token| Segment::parse(token).ok_or_else(|| invalid("malformed segment")))
            .collect::<Result<Vec<_>>>()?;

        match segments.last() {
            None => return Err(invalid("path is empty")),
            Some(Segment::Identity(_)) => {
                return Err(invalid("last segment must be a field name"))
            }
            Some(Segment::Literal(_)) => {}
        }

        Ok(CompiledPath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Identity column of the root level, if the path starts with one
    pub fn root_column(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Identity(column)) => Some(column),
            _ => None,
        }
    }

    /// Output field name at the end of the path
    pub fn leaf(&self) -> &str {
        self.segments.last().map(Segment::name).unwrap_or_default()
    }

    /// Identity columns in order from the root down
    pub fn identity_columns(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Identity(column) => Some(column.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, separator: &Separator) -> String {
        self.segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator.as_str())
    }
}
