//! Cached catalog login, written by an external helper.
//!
//! This side only reads it.  A record that parses and has not expired is a
//! *candidate*; it becomes usable once the catalog accepts it (see the
//! binary's session loader).

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session cache not found at {0}")]
    Missing(PathBuf),
    #[error("session cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session cache is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("session expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("session rejected by catalog: {0}")]
    Rejected(String),
}

#[derive(Clone, Deserialize)]
pub struct SessionRecord {
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// ISO-8601 text (naive values are local time) or epoch seconds.
    #[serde(default)]
    pub expiry_time: Option<serde_json::Value>,
}

// Tokens stay out of the log file.
impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token_type", &self.token_type)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expiry_time", &self.expiry_time)
            .finish()
    }
}

impl SessionRecord {
    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// `None` when the cache carries no expiry we can read; the live check
    /// then decides on its own.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.expiry_time.as_ref()? {
            serde_json::Value::Number(n) => {
                let secs = n.as_f64()?;
                DateTime::from_timestamp(secs as i64, 0)
            }
            serde_json::Value::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache and reject it if it has already expired.  Nothing here
    /// refreshes tokens.
    pub fn read(&self, now: DateTime<Utc>) -> Result<SessionRecord, SessionError> {
        if !self.path.exists() {
            return Err(SessionError::Missing(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let record: SessionRecord = serde_json::from_str(&content)?;
        if let Some(at) = record.expires_at().filter(|at| *at <= now) {
            return Err(SessionError::Expired(at));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expiry: serde_json::Value) -> SessionRecord {
        serde_json::from_value(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "secret-access-xyz",
            "refresh_token": "secret-refresh-xyz",
            "expiry_time": expiry,
        }))
        .unwrap()
    }

    #[test]
    fn test_expiry_formats() {
        let rfc = record("2030-01-02T03:04:05+00:00".into());
        assert_eq!(
            rfc.expires_at(),
            DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
                .ok()
                .map(|d| d.with_timezone(&Utc))
        );

        let epoch = record(1_900_000_000.into());
        assert_eq!(epoch.expires_at().map(|d| d.timestamp()), Some(1_900_000_000));

        let naive = record("2030-01-02T03:04:05.123456".into());
        assert!(naive.expires_at().is_some());

        let none = record(serde_json::Value::Null);
        assert_eq!(none.expires_at(), None);
        assert!(!none.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_expired_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let past = (Utc::now() - Duration::hours(2)).to_rfc3339();
        std::fs::write(
            &path,
            format!(
                r#"{{"token_type":"Bearer","access_token":"a","refresh_token":"r","expiry_time":"{past}"}}"#
            ),
        )
        .unwrap();

        let store = SessionStore::new(&path);
        assert!(matches!(store.read(Utc::now()), Err(SessionError::Expired(_))));
    }

    #[test]
    fn test_fresh_record_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let future = (Utc::now() + Duration::hours(2)).to_rfc3339();
        std::fs::write(
            &path,
            format!(
                r#"{{"token_type":"Bearer","access_token":"a","refresh_token":"r","expiry_time":"{future}"}}"#
            ),
        )
        .unwrap();

        let record = SessionStore::new(&path).read(Utc::now()).unwrap();
        assert_eq!(record.authorization(), "Bearer a");
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.read(Utc::now()), Err(SessionError::Missing(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"token_type": "Bearer"}"#).unwrap();
        assert!(matches!(
            SessionStore::new(&path).read(Utc::now()),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let text = format!("{:?}", record(serde_json::Value::Null));
        assert!(!text.contains("secret-access-xyz"));
        assert!(!text.contains("secret-refresh-xyz"));
        assert!(text.contains("<redacted>"));
    }
}
