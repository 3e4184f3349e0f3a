//! Dependency probe: runs once, before the listener binds.
//!
//! Tries the document store and the generation model, each under a bounded
//! timeout, and hands back the [`Resources`] every request will use:
//! the availability flags plus a [`StatusLog`] and a [`StoryChain`] already
//! wired to either the real dependency or its stand-in.  Nothing here can
//! fail: every error becomes a `false` flag and a log line.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, LlmConfig, StoreConfig, StoreTarget};
use crate::llm::providers;
use crate::subsystems::memory::{StatusLog, StatusStore, StoreError};
use crate::subsystems::stories::{ModelTier, StoryChain};

// ── Availability ──────────────────────────────────────────────────────────────

/// Which optional dependencies answered at startup.
///
/// Built once by [`probe`] and only read afterwards; there is no setter and
/// no reconnect path, so a `false` lasts until the process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityState {
    #[serde(rename = "mongodb")]
    store: bool,
    ai_model: bool,
}

impl AvailabilityState {
    pub fn new(store: bool, ai_model: bool) -> Self {
        Self { store, ai_model }
    }

    /// Document store reachable.
    pub fn store(&self) -> bool {
        self.store
    }

    /// Generation model loaded and reachable.
    pub fn ai_model(&self) -> bool {
        self.ai_model
    }
}

/// Everything request handling needs, as decided by the probe.
#[derive(Clone)]
pub struct Resources {
    pub availability: AvailabilityState,
    pub status_log: StatusLog,
    pub stories: StoryChain,
}

// ── Probe ─────────────────────────────────────────────────────────────────────

/// Probe the store and the model concurrently.
pub async fn probe(config: &Config) -> Resources {
    let ((store_ok, status_log), (model_ok, stories)) = tokio::join!(
        probe_store(&config.store),
        probe_model(&config.llm, config.llm_api_key.clone()),
    );

    let availability = AvailabilityState::new(store_ok, model_ok);
    info!(
        store = store_ok,
        store_backend = %status_log.store_type(),
        ai_model = model_ok,
        "dependency probe complete"
    );

    Resources { availability, status_log, stories }
}

async fn probe_store(config: &StoreConfig) -> (bool, StatusLog) {
    let target = config.target();
    if target == StoreTarget::Disabled {
        info!("document store disabled by config; status checks will not persist");
        return (false, StatusLog::noop());
    }

    let timeout = Duration::from_secs(config.connect_timeout_seconds);
    let opened = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking({
            let target = target.clone();
            move || open_store(&target)
        }),
    )
    .await;

    let outcome = match opened {
        Err(_) => Err(StoreError::Open(format!("no answer within {timeout:?}"))),
        Ok(Err(join)) => Err(StoreError::Join(join.to_string())),
        Ok(Ok(result)) => result,
    };

    match outcome {
        Ok(store) => {
            info!(?target, backend = store.store_type(), "document store connected");
            (true, StatusLog::new(store))
        }
        Err(e) => {
            warn!(?target, error = %e, "document store unavailable; running without persistence");
            (false, StatusLog::noop())
        }
    }
}

/// Open and ping the configured store.  Blocking.
#[cfg(feature = "store-sqlite")]
fn open_store(target: &StoreTarget) -> Result<Arc<dyn StatusStore>, StoreError> {
    use crate::subsystems::memory::stores::sqlite::SqliteStatusStore;

    let store = match target {
        StoreTarget::Memory => SqliteStatusStore::open_in_memory()?,
        StoreTarget::File(path) => SqliteStatusStore::open(path)?,
        StoreTarget::Disabled => return Err(StoreError::Open("store disabled".into())),
    };
    store.ping()?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "store-sqlite"))]
fn open_store(_target: &StoreTarget) -> Result<Arc<dyn StatusStore>, StoreError> {
    Err(StoreError::Open("built without a store backend (enable `store-sqlite`)".into()))
}

async fn probe_model(config: &LlmConfig, api_key: Option<String>) -> (bool, StoryChain) {
    if config.is_disabled() {
        info!("AI model disabled by config; serving curated stories");
        return (false, StoryChain::curated_only());
    }

    let provider = match providers::build(config, api_key) {
        Ok(p) => p,
        Err(e) => {
            warn!(provider = %config.provider, error = %e, "AI model failed to load; serving curated stories");
            return (false, StoryChain::curated_only());
        }
    };

    let timeout = Duration::from_secs(config.probe_timeout_seconds);
    match tokio::time::timeout(timeout, provider.ping()).await {
        Ok(Ok(())) => {
            info!(provider = provider.name(), "AI model ready");
            (true, StoryChain::with_model(ModelTier::new(provider, config)))
        }
        Ok(Err(e)) => {
            warn!(provider = provider.name(), error = %e, "AI model unreachable; serving curated stories");
            (false, StoryChain::curated_only())
        }
        Err(_) => {
            warn!(provider = provider.name(), ?timeout, "AI model probe timed out; serving curated stories");
            (false, StoryChain::curated_only())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn defaults_for_tests_have_store_and_no_model() {
        let res = probe(&Config::test_default()).await;
        assert_eq!(res.availability, AvailabilityState::new(cfg!(feature = "store-sqlite"), false));
        assert!(!res.stories.has_model());
    }

    #[tokio::test]
    async fn disabled_store_is_unavailable() {
        let mut config = Config::test_default();
        config.store.url = String::new();
        let res = probe(&config).await;
        assert!(!res.availability.store());
        assert_eq!(res.status_log.store_type(), "noop");
    }

    #[tokio::test]
    async fn unreachable_store_target_degrades() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::test_default();
        config.store.url = dir.path().join("missing/dir").to_string_lossy().into_owned();

        let res = probe(&config).await;
        assert!(!res.availability.store());
        assert_eq!(res.status_log.store_type(), "noop");

        // The substitute still answers.
        let rec = res.status_log.insert("alice").await;
        assert_eq!(rec.client_name, "alice");
        assert!(res.status_log.list_all(1000).await.is_empty());
    }

    #[cfg(feature = "store-sqlite")]
    #[tokio::test]
    async fn file_store_in_existing_dir_connects() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::test_default();
        config.store.url = dir.path().to_string_lossy().into_owned();

        let res = probe(&config).await;
        assert!(res.availability.store());
        assert_eq!(res.status_log.store_type(), "sqlite");
        assert!(dir.path().join("test_database.sqlite3").exists());
    }

    #[tokio::test]
    async fn dummy_model_is_available() {
        let mut config = Config::test_default();
        config.llm.provider = "dummy".into();
        let res = probe(&config).await;
        assert!(res.availability.ai_model());
        assert!(res.stories.has_model());
    }

    #[tokio::test]
    async fn unknown_model_provider_degrades() {
        let mut config = Config::test_default();
        config.llm.provider = "not-a-provider".into();
        let res = probe(&config).await;
        assert!(!res.availability.ai_model());
        assert!(!res.stories.has_model());
    }

    #[tokio::test]
    async fn unreachable_model_degrades() {
        let mut config = Config::test_default();
        config.llm.provider = "openai".into();
        config.llm.openai.api_base_url = "http://127.0.0.1:1/v1/completions".into();
        let res = probe(&config).await;
        assert!(!res.availability.ai_model());
    }

    #[test]
    fn availability_json_uses_wire_names() {
        let json = serde_json::to_value(AvailabilityState::new(true, false)).unwrap();
        assert_eq!(json["mongodb"], true);
        assert_eq!(json["ai_model"], false);
    }
}
