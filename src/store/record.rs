//! Stored row shape and expiry clock helpers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A row as the backing engine sees it.
///
/// `payload` is opaque JSON text; backends never parse it. `expires_at` is an
/// absolute time in seconds since the Unix epoch, `None` meaning the entry
/// never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<f64>,
}

impl Record {
    /// Creates a record that never expires.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            expires_at: None,
        }
    }

    /// Creates a record expiring `ttl` after `now` (seconds since the epoch).
    pub fn with_ttl(payload: impl Into<String>, ttl: Duration, now: f64) -> Self {
        Self {
            payload: payload.into(),
            expires_at: Some(now + ttl.as_secs_f64()),
        }
    }

    /// Returns true when the expiry time lies strictly before `now`.
    pub fn is_expired_at(&self, now: f64) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

/// Current wall-clock time in fractional seconds since the Unix epoch.
///
/// # Errors
///
/// Returns an error if the system clock is set before the epoch.
pub fn unix_now() -> Result<f64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?;
    Ok(elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_ttl_never_expires() {
        let record = Record::new("{}");
        assert!(!record.is_expired_at(f64::MAX));
    }

    #[test]
    fn test_expiry_is_strictly_after_deadline() {
        let record = Record::with_ttl("{}", Duration::from_secs(1), 100.0);
        assert_eq!(record.expires_at, Some(101.0));
        assert!(!record.is_expired_at(100.5));
        assert!(!record.is_expired_at(101.0));
        assert!(record.is_expired_at(101.001));
    }

    #[test]
    fn test_serialized_form_omits_missing_expiry() {
        let json = serde_json::to_string(&Record::new(r#"{"a":1}"#)).unwrap();
        assert_eq!(json, r#"{"payload":"{\"a\":1}"}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expires_at, None);
    }

    #[test]
    fn test_unix_now_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(unix_now().unwrap() > 1_577_836_800.0);
    }
}
