use crate::tidal::TidalCatalog;
use chrono::{DateTime, Utc};
use std::future::Future;
use tidal_proto::config::CatalogConfig;
use tidal_proto::session::{SessionError, SessionRecord, SessionStore};
use tracing::{info, warn};

/// Cached session → live-checked catalog handle, or `None` for any failure.
pub async fn open_catalog(store: &SessionStore, config: &CatalogConfig) -> Option<TidalCatalog> {
    load_session(store, Utc::now(), |record| async move {
        TidalCatalog::login(&record, config).await
    })
    .await
}

/// Read the cache, drop it if expired, then ask `live_check` whether the
/// catalog still accepts it.  Never fails; every cause ends up as `None`.
pub async fn load_session<T, F, Fut>(
    store: &SessionStore,
    now: DateTime<Utc>,
    live_check: F,
) -> Option<T>
where
    F: FnOnce(SessionRecord) -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let record = match store.read(now) {
        Ok(record) => record,
        Err(e) => {
            info!("session: unavailable ({})", e);
            return None;
        }
    };
    match live_check(record).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("session: live check failed ({})", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn write_cache(dir: &tempfile::TempDir, expiry: DateTime<Utc>) -> SessionStore {
        let path = dir.path().join("tidal_session.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "token_type": "Bearer",
                "access_token": "a",
                "refresh_token": "r",
                "expiry_time": expiry.to_rfc3339(),
            })
            .to_string(),
        )
        .unwrap();
        SessionStore::new(path)
    }

    #[tokio::test]
    async fn test_expired_cache_skips_live_check() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let store = write_cache(&dir, now - Duration::minutes(5));
        let mut checked = false;
        let handle = load_session(&store, now, |_| {
            checked = true;
            async { Ok::<_, SessionError>(()) }
        })
        .await;
        assert_eq!(handle, None);
        assert!(!checked);
    }

    #[tokio::test]
    async fn test_live_session_yields_handle() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let store = write_cache(&dir, now + Duration::hours(1));
        let handle = load_session(&store, now, |record| async move {
            Ok::<_, SessionError>(record.authorization())
        })
        .await;
        assert_eq!(handle.as_deref(), Some("Bearer a"));
    }

    #[tokio::test]
    async fn test_rejected_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let store = write_cache(&dir, now + Duration::hours(1));
        let handle: Option<()> = load_session(&store, now, |_| async {
            Err(SessionError::Rejected("status 401".into()))
        })
        .await;
        assert_eq!(handle, None);
    }

    #[tokio::test]
    async fn test_missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("absent.json"));
        let handle = load_session(&store, Utc::now(), |_| async { Ok::<_, SessionError>(1) }).await;
        assert_eq!(handle, None);
    }
}
