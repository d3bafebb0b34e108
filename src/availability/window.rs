//! Booking windows and the two overlap rules

use jiff::civil::DateTime;

use crate::error::{AppError, AppResult};

/// Closed interval `[start, end]` of civil date-times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime,
    pub end: DateTime,
}

/// How two windows that only touch at an endpoint are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapRule {
    /// Touching endpoints compete (materials)
    Inclusive,
    /// Touching endpoints are compatible (vehicles)
    Exclusive,
}

impl Window {
    /// Rejects windows whose start is after their end
    pub fn new(start: DateTime, end: DateTime) -> AppResult<Self> {
        if start > end {
            return Err(AppError::validation(
                "data_inizio",
                "data_inizio non può essere successiva a data_fine",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &Window, rule: OverlapRule) -> bool {
        match rule {
            OverlapRule::Inclusive => !(self.end < other.start || self.start > other.end),
            OverlapRule::Exclusive => !(self.end <= other.start || self.start >= other.end),
        }
    }
}

/// Window filter for list endpoints: either bound may be missing.
///
/// A reservation matches when it overlaps the given bounds under the
/// inclusive rule, i.e. it ends on or after `from` and starts on or before
/// `to`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowBounds {
    pub from: Option<DateTime>,
    pub to: Option<DateTime>,
}

impl WindowBounds {
    pub fn matches(&self, window: &Window) -> bool {
        self.from.is_none_or(|from| window.end >= from)
            && self.to.is_none_or(|to| window.start <= to)
    }
}
