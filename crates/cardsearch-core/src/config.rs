//! Layered configuration loader and typed search settings.
//!
//! Uses Figment to merge `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nesting, e.g.
//! `APP_SEARCH__MIN_LENGTH=3`). `APP_CONFIG_DIR` moves the directory the
//! files are read from; `~` and `${VAR}` are expanded.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{EntityType, HierarchyMode, Strategy, DEFAULT_LIMIT};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base = env::var("APP_CONFIG_DIR").map(expand_path).unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(&base, &env_name)
    }

    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(resolve_with_base(dir, "config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(resolve_with_base(dir, "config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(resolve_with_base(dir, "config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(resolve_with_base(dir, "config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub search: SearchSettings,
    pub autocomplete: AutocompleteSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self { Self { base_url: "http://localhost:3000".to_string(), timeout_ms: 10_000 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub min_length: usize,
    pub debounce_ms: u64,
    pub limit: usize,
    pub strategy: Strategy,
    pub types: Vec<EntityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyMode>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_length: 2,
            debounce_ms: 300,
            limit: DEFAULT_LIMIT,
            strategy: Strategy::Optimized,
            types: EntityType::ALL.to_vec(),
            hierarchy: None,
        }
    }
}

/// Presets applied when the strategy is `autocomplete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    pub min_length: usize,
    pub debounce_ms: u64,
}

impl Default for AutocompleteSettings {
    fn default() -> Self { Self { min_length: 1, debounce_ms: 150 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub fresh_secs: u64,
    pub evict_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self { Self { fresh_secs: 120, evict_secs: 300 } }
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("api.base_url must not be empty".into()));
        }
        if self.search.limit == 0 {
            return Err(Error::InvalidConfig("search.limit must be at least 1".into()));
        }
        if self.cache.evict_secs < self.cache.fresh_secs {
            return Err(Error::InvalidConfig(format!(
                "cache.evict_secs ({}) is shorter than cache.fresh_secs ({})",
                self.cache.evict_secs, self.cache.fresh_secs
            )));
        }
        if self.search.strategy == Strategy::Hierarchical && self.search.hierarchy.is_none() {
            return Err(Error::InvalidConfig("hierarchical strategy needs search.hierarchy".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
