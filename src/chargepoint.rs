//! ChargePoint mobile API client for Chargeguard
//!
//! Thin glue between the abstract `SessionProvider` capability and the
//! ChargePoint mobile/activity endpoints: request envelopes, response
//! unwrapping, and decoding of the session fields the monitor consumes.

use crate::config::ChargePointConfig;
use crate::error::{ChargeGuardError, Result};
use crate::logging::get_logger;
use crate::provider::SessionProvider;
use crate::session::{ChargingStatus, PaymentType, SessionSnapshot};
use serde_json::{Value, json};

const MOBILEAPI_ENDPOINT: &str = "https://webservices.chargepoint.com/backend.php/mobileapi/v3";
const ACTIVITY_ENDPOINT: &str = "https://mc.chargepoint.com/map-prod/v2";

/// A client that talks to the ChargePoint API
pub struct ChargePointClient {
    username: String,
    password: String,
    user_id: Option<u64>,
    http: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

impl ChargePointClient {
    /// Create a new client; no network traffic happens until `authenticate`
    pub fn new(config: &ChargePointConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let logger = get_logger("chargepoint");
        Ok(Self {
            username: config.username.clone(),
            password: config.password.clone(),
            user_id: None,
            http,
            logger,
        })
    }

    fn user_id(&self) -> Result<u64> {
        self.user_id.ok_or_else(|| {
            ChargeGuardError::auth("User id not known yet. Perhaps login was not yet successful?")
        })
    }

    async fn post_mobileapi(&self, request: &Value) -> Result<Value> {
        let response = self.http.post(MOBILEAPI_ENDPOINT).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChargeGuardError::api(format!(
                "Got an unsuccessful HTTP status of {}",
                status
            )));
        }
        let body: Value = response.json().await?;
        unwrap_envelope(&body)
    }

    async fn get_activity(&self, request: &Value) -> Result<Value> {
        // The activity endpoint wants the request as a JSON body on a GET
        let response = self.http.get(ACTIVITY_ENDPOINT).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChargeGuardError::api(format!(
                "Got an unsuccessful HTTP status of {}",
                status
            )));
        }
        let body: Value = response.json().await?;
        unwrap_envelope(&body)
    }
}

#[async_trait::async_trait]
impl SessionProvider for ChargePointClient {
    async fn authenticate(&mut self) -> Result<()> {
        let request = json!({
            "validate_login": {
                "user_name": self.username,
                "password": self.password,
            }
        });
        self.logger.debug("Sending login request");
        let login_data = self.post_mobileapi(&request).await?;

        // Other APIs want user_id as a number, so it's converted right here
        self.user_id = Some(decode_user_id(&login_data)?);

        self.logger
            .info(&format!("Successfully logged in as {}", self.username));
        Ok(())
    }

    async fn fetch_current_session(&mut self) -> Result<SessionSnapshot> {
        let request = json!({
            "user_id": self.user_id()?,
            "charging_activity": {
                "page_size": 1,
            }
        });
        self.logger
            .debug(&format!("Sending charging activity request: {}", request));
        let activity_data = self.get_activity(&request).await?;
        snapshot_from_activity(&activity_data)
    }

    async fn stop_session(&mut self, session: &SessionSnapshot) -> Result<()> {
        let request = json!({
            "user_id": self.user_id()?,
            "stop_session": {
                "device_id": session.device_id,
                "port_number": session.port_number,
            }
        });
        self.logger
            .debug(&format!("Sending stop charging request: {}", request));
        self.post_mobileapi(&request).await?;
        self.logger
            .info(&format!("Successfully stopped charging for {}", session));
        Ok(())
    }
}

/// Unwrap the single-pair response envelope shared by both endpoints.
///
/// Both endpoints wrap their payload in exactly one top-level key. The
/// activity endpoint relays errors through a top-level `error` key, the
/// mobile endpoint through a `status: false` field inside the payload.
pub(crate) fn unwrap_envelope(body: &Value) -> Result<Value> {
    if body.get("error").is_some() {
        return Err(ChargeGuardError::api(format!(
            "Response contained an error: {}",
            body
        )));
    }

    let object = body.as_object().ok_or_else(|| {
        ChargeGuardError::api(format!("Response was not a JSON object: {}", body))
    })?;
    if object.len() != 1 {
        return Err(ChargeGuardError::api(format!(
            "Response was expected to contain a single top-level key-value pair but was {}",
            body
        )));
    }

    let data = object
        .values()
        .next()
        .cloned()
        .unwrap_or(Value::Null);

    if data.get("status").and_then(Value::as_bool) == Some(false) {
        return Err(ChargeGuardError::api(format!(
            "Response contained an error: {}",
            body
        )));
    }

    Ok(data)
}

pub(crate) fn decode_user_id(login_data: &Value) -> Result<u64> {
    let raw = login_data
        .get("user_id")
        .ok_or_else(|| ChargeGuardError::api("Login response missing user_id"))?;
    match raw {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ChargeGuardError::api(format!("Invalid user_id: {}", raw))),
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|_| ChargeGuardError::api(format!("Invalid user_id: {}", raw))),
        _ => Err(ChargeGuardError::api(format!("Invalid user_id: {}", raw))),
    }
}

/// Decode the most recent session from an activity payload
pub(crate) fn snapshot_from_activity(activity_data: &Value) -> Result<SessionSnapshot> {
    let sessions = activity_data
        .get("session_info")
        .and_then(Value::as_array)
        .ok_or_else(|| ChargeGuardError::api("Activity response missing session_info"))?;

    let most_recent = sessions.first().ok_or_else(|| {
        ChargeGuardError::api("No charging sessions found for this account")
    })?;

    let status = ChargingStatus::from_wire(get_str(most_recent, "current_charging")?)?;
    let payment = PaymentType::from_wire(get_str(most_recent, "payment_type")?)?;

    Ok(SessionSnapshot {
        session_id: get_id_string(most_recent, "session_id")?,
        is_active: status.is_active(),
        is_fully_charged: status == ChargingStatus::FullyCharged,
        is_paid: payment == PaymentType::Paid,
        company_name: get_str(most_recent, "company_name")?.to_string(),
        power_kw: get_f64(most_recent, "power_kw")?,
        device_id: get_u64(most_recent, "device_id")?,
        port_number: u32::try_from(get_u64(most_recent, "outlet_number")?)
            .map_err(|_| ChargeGuardError::api("Invalid outlet_number"))?,
    })
}

fn get_str<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ChargeGuardError::api(format!("Session missing string field {}", key)))
}

fn get_f64(value: &Value, key: &str) -> Result<f64> {
    value
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ChargeGuardError::api(format!("Session missing numeric field {}", key)))
}

fn get_u64(value: &Value, key: &str) -> Result<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| ChargeGuardError::api(format!("Session missing numeric field {}", key)))
}

/// Session ids show up both as numbers and strings depending on endpoint
/// version; normalize to the opaque string the monitor compares.
fn get_id_string(value: &Value, key: &str) -> Result<String> {
    match value.get(key) {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ChargeGuardError::api(format!(
            "Session missing id field {}",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity_payload(current_charging: &str, payment_type: &str) -> Value {
        json!({
            "session_info": [{
                "current_charging": current_charging,
                "payment_type": payment_type,
                "company_name": "ACME",
                "power_kw": 3.3,
                "session_id": 376124401u64,
                "device_id": 151925u64,
                "outlet_number": 1,
            }]
        })
    }

    #[test]
    fn unwrap_envelope_returns_single_payload() {
        let body = json!({"login": {"user_id": 42, "status": true}});
        let data = unwrap_envelope(&body).unwrap();
        assert_eq!(data.get("user_id").and_then(Value::as_u64), Some(42));
    }

    #[test]
    fn unwrap_envelope_rejects_error_key() {
        let body = json!({"error": {"message": "nope"}});
        assert!(matches!(
            unwrap_envelope(&body).unwrap_err(),
            ChargeGuardError::Api { .. }
        ));
    }

    #[test]
    fn unwrap_envelope_rejects_multiple_pairs() {
        let body = json!({"a": 1, "b": 2});
        assert!(unwrap_envelope(&body).is_err());
    }

    #[test]
    fn unwrap_envelope_rejects_status_false() {
        let body = json!({"stop_session": {"status": false}});
        assert!(unwrap_envelope(&body).is_err());
    }

    #[test]
    fn decode_user_id_accepts_number_and_string() {
        assert_eq!(decode_user_id(&json!({"user_id": 42})).unwrap(), 42);
        assert_eq!(decode_user_id(&json!({"user_id": "42"})).unwrap(), 42);
        assert!(decode_user_id(&json!({"user_id": "forty-two"})).is_err());
        assert!(decode_user_id(&json!({})).is_err());
    }

    #[test]
    fn snapshot_decodes_active_paid_session() {
        let snapshot = snapshot_from_activity(&activity_payload("in_use", "paid")).unwrap();
        assert_eq!(snapshot.session_id, "376124401");
        assert!(snapshot.is_active);
        assert!(!snapshot.is_fully_charged);
        assert!(snapshot.is_paid);
        assert_eq!(snapshot.company_name, "ACME");
        assert!((snapshot.power_kw - 3.3).abs() < f64::EPSILON);
        assert_eq!(snapshot.device_id, 151925);
        assert_eq!(snapshot.port_number, 1);
    }

    #[test]
    fn snapshot_decodes_fully_charged_as_active() {
        let snapshot =
            snapshot_from_activity(&activity_payload("fully_charged", "paid")).unwrap();
        assert!(snapshot.is_active);
        assert!(snapshot.is_fully_charged);
    }

    #[test]
    fn snapshot_decodes_done_as_inactive() {
        let snapshot = snapshot_from_activity(&activity_payload("done", "free")).unwrap();
        assert!(!snapshot.is_active);
        assert!(!snapshot.is_paid);
    }

    #[test]
    fn unknown_status_values_fail_loudly() {
        assert!(matches!(
            snapshot_from_activity(&activity_payload("paused", "paid")).unwrap_err(),
            ChargeGuardError::UnrecognizedValue { .. }
        ));
        assert!(matches!(
            snapshot_from_activity(&activity_payload("in_use", "sponsored")).unwrap_err(),
            ChargeGuardError::UnrecognizedValue { .. }
        ));
    }

    #[test]
    fn empty_activity_feed_is_an_error() {
        let err = snapshot_from_activity(&json!({"session_info": []})).unwrap_err();
        assert!(matches!(err, ChargeGuardError::Api { .. }));

        let err = snapshot_from_activity(&json!({})).unwrap_err();
        assert!(matches!(err, ChargeGuardError::Api { .. }));
    }
}
