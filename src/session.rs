//! Charging session snapshot types for Chargeguard
//!
//! This module defines the point-in-time view of the most recent charging
//! session and the decoding of the status-like API fields it is built from.

use crate::error::{ChargeGuardError, Result};
use serde::{Deserialize, Serialize};

/// Station-reported charging status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingStatus {
    /// Vehicle is drawing power
    InUse,

    /// Vehicle is plugged in, waiting to draw power
    Waiting,

    /// Station reports the vehicle as fully charged
    FullyCharged,

    /// Session has ended
    Done,
}

impl ChargingStatus {
    /// Decode the API `current_charging` field.
    ///
    /// Unknown values are a defect that needs visibility, not a state to
    /// default silently.
    pub fn from_wire(value: &str) -> Result<Self> {
        match value {
            "in_use" => Ok(Self::InUse),
            "waiting" => Ok(Self::Waiting),
            "fully_charged" => Ok(Self::FullyCharged),
            "done" => Ok(Self::Done),
            other => Err(ChargeGuardError::unrecognized("current_charging", other)),
        }
    }

    /// Whether the station still considers the session in progress
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Done)
    }
}

/// Station-reported payment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    /// Session is billed
    Paid,

    /// Session is free of charge
    Free,
}

impl PaymentType {
    /// Decode the API `payment_type` field
    pub fn from_wire(value: &str) -> Result<Self> {
        match value {
            "paid" => Ok(Self::Paid),
            "free" => Ok(Self::Free),
            other => Err(ChargeGuardError::unrecognized("payment_type", other)),
        }
    }
}

/// Point-in-time view of the most recent charging session.
///
/// Every poll produces a fresh value; a snapshot is never mutated. The
/// `session_id` stays stable for the lifetime of one physical charging
/// session and changes when a new one starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Opaque stable session identifier
    pub session_id: String,

    /// Whether the station still reports the session in progress
    pub is_active: bool,

    /// Station-reported full-charge flag
    pub is_fully_charged: bool,

    /// Whether the session is billed (vs free)
    pub is_paid: bool,

    /// Charging network operator name
    pub company_name: String,

    /// Instantaneous power draw (kW)
    pub power_kw: f64,

    /// Physical charger identifier, needed to issue a stop
    pub device_id: u64,

    /// Outlet on the charger, needed to issue a stop
    pub port_number: u32,
}

impl SessionSnapshot {
    /// Whether the snapshot's draw is below the given threshold
    pub fn is_low_power(&self, threshold_kw: f64) -> bool {
        self.power_kw < threshold_kw
    }
}

impl std::fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "session {} ({}, {:.2} kW, active={}, fully_charged={}, paid={})",
            self.session_id,
            self.company_name,
            self.power_kw,
            self.is_active,
            self.is_fully_charged,
            self.is_paid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charging_status_from_wire() {
        assert_eq!(
            ChargingStatus::from_wire("in_use").unwrap(),
            ChargingStatus::InUse
        );
        assert_eq!(
            ChargingStatus::from_wire("waiting").unwrap(),
            ChargingStatus::Waiting
        );
        assert_eq!(
            ChargingStatus::from_wire("fully_charged").unwrap(),
            ChargingStatus::FullyCharged
        );
        assert_eq!(
            ChargingStatus::from_wire("done").unwrap(),
            ChargingStatus::Done
        );
    }

    #[test]
    fn charging_status_activity() {
        assert!(ChargingStatus::InUse.is_active());
        assert!(ChargingStatus::Waiting.is_active());
        assert!(ChargingStatus::FullyCharged.is_active());
        assert!(!ChargingStatus::Done.is_active());
    }

    #[test]
    fn unknown_wire_values_fail() {
        let err = ChargingStatus::from_wire("paused").unwrap_err();
        assert!(matches!(
            err,
            ChargeGuardError::UnrecognizedValue { .. }
        ));

        let err = PaymentType::from_wire("sponsored").unwrap_err();
        assert!(matches!(
            err,
            ChargeGuardError::UnrecognizedValue { .. }
        ));
    }

    #[test]
    fn low_power_threshold_is_exclusive() {
        let snapshot = SessionSnapshot {
            session_id: "376124401".to_string(),
            is_active: true,
            is_fully_charged: false,
            is_paid: true,
            company_name: "ACME".to_string(),
            power_kw: 0.1,
            device_id: 151925,
            port_number: 1,
        };
        assert!(!snapshot.is_low_power(0.1));
        assert!(snapshot.is_low_power(0.2));
    }
}
