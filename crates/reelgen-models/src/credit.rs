//! Credit reservation data models.
//!
//! Billing is two-phase: the amount is deducted from the user's balance
//! at reserve time (the visible balance always reflects committed spend),
//! then the reservation is either captured (status flip only) or released
//! (amount restored) exactly once.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a credit reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reservation lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Amount deducted, outcome pending
    #[default]
    Reserved,
    /// Spend committed; no balance mutation (deduction already happened)
    Captured,
    /// Amount restored to the user's balance
    Released,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Captured => "captured",
            ReservationStatus::Released => "released",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, ReservationStatus::Captured | ReservationStatus::Released)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provisional credit deduction awaiting commit or refund.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreditReservation {
    /// Unique reservation ID
    pub id: ReservationId,

    /// User whose balance was deducted
    pub user_id: String,

    /// Positive amount deducted at reserve time
    pub amount: i64,

    /// Reservation status
    #[serde(default)]
    pub status: ReservationStatus,

    /// Human-readable reason recorded at settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_reason: Option<String>,

    /// When the reservation was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CreditReservation {
    /// Create a new open reservation.
    pub fn new(user_id: impl Into<String>, amount: i64) -> Self {
        let now = Utc::now();
        Self {
            id: ReservationId::new(),
            user_id: user_id.into(),
            amount,
            status: ReservationStatus::Reserved,
            settled_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_starts_open() {
        let res = CreditReservation::new("user123", 40);
        assert_eq!(res.status, ReservationStatus::Reserved);
        assert!(!res.status.is_settled());
    }

    #[test]
    fn test_settled_states() {
        assert!(ReservationStatus::Captured.is_settled());
        assert!(ReservationStatus::Released.is_settled());
        assert!(!ReservationStatus::Reserved.is_settled());
    }
}
