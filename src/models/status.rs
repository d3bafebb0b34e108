//! Reservation lifecycle

use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Known reservation statuses.
///
/// The column is free text; this enum is only consulted when status
/// transitions are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Prenotata,
    Confermata,
    InCorso,
    Completata,
    Annullata,
}

impl ReservationStatus {
    /// Status given to new reservations
    pub const INITIAL: ReservationStatus = ReservationStatus::Prenotata;

    pub const ALL: [ReservationStatus; 5] = [
        ReservationStatus::Prenotata,
        ReservationStatus::Confermata,
        ReservationStatus::InCorso,
        ReservationStatus::Completata,
        ReservationStatus::Annullata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Prenotata => "prenotata",
            ReservationStatus::Confermata => "confermata",
            ReservationStatus::InCorso => "in_corso",
            ReservationStatus::Completata => "completata",
            ReservationStatus::Annullata => "annullata",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completata | ReservationStatus::Annullata
        )
    }

    /// `prenotata -> confermata -> in_corso -> completata`, cancellation from
    /// any non-terminal status. Staying in place is always allowed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;

        if *self == next {
            return true;
        }

        match next {
            Annullata => !self.is_terminal(),
            _ => matches!(
                (self, next),
                (Prenotata, Confermata) | (Confermata, InCorso) | (InCorso, Completata)
            ),
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation("stato", format!("Stato sconosciuto: {}", s)))
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a requested status change against the lifecycle.
///
/// With `enforce` off any string is accepted. With it on the requested
/// status must be known and reachable from the current one; a current value
/// outside the vocabulary (legacy free text) may move to any known status.
pub fn check_status_change(current: &str, requested: &str, enforce: bool) -> AppResult<()> {
    if !enforce {
        return Ok(());
    }

    let next: ReservationStatus = requested.parse()?;
    let Ok(current) = current.parse::<ReservationStatus>() else {
        return Ok(());
    };

    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::validation(
            "stato",
            format!("Transizione di stato non consentita: {} -> {}", current, next),
        ))
    }
}
