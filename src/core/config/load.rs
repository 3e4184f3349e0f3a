//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies the env overrides collected in [`Overrides`].

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::RawConfig;
use super::types::*;

/// Env-var overrides applied on top of the TOML values.
///
/// Tests build this directly instead of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `FOLKLORE_LOG_LEVEL`
    pub log_level: Option<String>,
    /// `FOLKLORE_BIND`
    pub bind: Option<String>,
    /// `STORE_URL`
    pub store_url: Option<String>,
    /// `DB_NAME`
    pub db_name: Option<String>,
    /// `AI_MODEL`
    pub llm_provider: Option<String>,
    /// `LLM_API_KEY`
    pub llm_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("FOLKLORE_LOG_LEVEL").ok(),
            bind: env::var("FOLKLORE_BIND").ok(),
            store_url: env::var("STORE_URL").ok(),
            db_name: env::var("DB_NAME").ok(),
            llm_provider: env::var("AI_MODEL").ok(),
            llm_api_key: env::var("LLM_API_KEY").ok(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively: the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, the serde
/// defaults are used as-is.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, overrides)
    } else {
        Ok(resolve(RawConfig::default(), overrides))
    }
}

/// Internal loader: accepts an explicit path and the overrides to apply.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let merged = load_raw_merged(path, &mut HashSet::new())?;
    let parsed: RawConfig = Deserialize::deserialize(merged)
        .map_err(|e| AppError::Config(format!("invalid config in {}: {e}", path.display())))?;
    Ok(resolve(parsed, overrides))
}

fn resolve(raw: RawConfig, overrides: Overrides) -> Config {
    let store_url = overrides.store_url.unwrap_or(raw.store.url);
    let store_url = match store_url.trim() {
        "" | ":memory:" => store_url.trim().to_string(),
        path => expand_home(path).to_string_lossy().into_owned(),
    };

    Config {
        log_level: overrides.log_level.unwrap_or(raw.server.log_level),
        server: ServerConfig {
            bind: overrides.bind.unwrap_or(raw.server.bind),
        },
        store: StoreConfig {
            url: store_url,
            db_name: overrides.db_name.unwrap_or(raw.store.db_name),
            connect_timeout_seconds: raw.store.connect_timeout_seconds,
        },
        llm: LlmConfig {
            provider: overrides.llm_provider.unwrap_or(raw.llm.provider),
            max_concurrent: raw.llm.max_concurrent.max(1),
            prompt_prefix_chars: raw.llm.prompt_prefix_chars,
            min_output_chars: raw.llm.min_output_chars,
            probe_timeout_seconds: raw.llm.probe_timeout_seconds,
            openai: OpenAiConfig {
                api_base_url: raw.llm.openai.api_base_url,
                model: raw.llm.openai.model,
                temperature: raw.llm.openai.temperature,
                top_p: raw.llm.openai.top_p,
                repetition_penalty: raw.llm.openai.repetition_penalty,
                timeout_seconds: raw.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: overrides.llm_api_key,
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
