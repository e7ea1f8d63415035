//! Coordinate validation for range requests.
//!
//! Coordinates are zero-based and half-open: `[start, end)`. Only ordering is
//! checked here; bounds against the sequence length are left to the backend,
//! which returns an empty or truncated result for out-of-range requests.

use crate::{Error, Result};

/// Validated half-open interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateRange {
    start: i64,
    end: i64,
}

impl CoordinateRange {
    /// Accepts `start == end` as an empty range.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses raw query values, treating missing or malformed numbers as 0.
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Self::new(parse_coordinate(start), parse_coordinate(end))
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Length handed to the sequence query, which takes `(start, length)`.
    /// Saturates at `i64::MAX` for ranges wider than that.
    pub fn len(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub fn parse_coordinate(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
