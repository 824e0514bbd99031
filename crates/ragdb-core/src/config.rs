//! Configuration loading and the retrieval knob surface.
//!
//! Figment merges `config.toml` + `config.<env>.toml` + `RAGDB_*` env
//! vars. Every tunable of the ranking pipeline lives in
//! [`RetrievalConfig`] under the `retrieval` key; nothing else in the
//! workspace hardcodes a blend weight or a BM25 constant.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("RAGDB_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The retrieval knobs, falling back to the documented defaults when
    /// the `retrieval` section is absent.
    pub fn retrieval(&self) -> RetrievalConfig {
        self.figment
            .extract_inner("retrieval")
            .unwrap_or_default()
    }
}

/// Named, injectable ranking parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Weight of the semantic score in the blend; 1.0 collapses to the
    /// semantic ranking, 0.0 to BM25.
    pub alpha: f32,
    /// BM25 term-frequency saturation.
    pub k1: f32,
    /// BM25 length normalization.
    pub b: f32,
    /// Raw candidates fetched per source per partition before re-ranking.
    pub topk_per_source: usize,
    /// Upper bound on one dense-backend partition call.
    pub dense_timeout_ms: u64,
    /// Prefix prepended to query text before embedding (e5-style models).
    pub query_prefix: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            k1: 1.5,
            b: 0.75,
            topk_per_source: 50,
            dense_timeout_ms: 5_000,
            query_prefix: "query: ".to_string(),
        }
    }
}

impl RetrievalConfig {
    /// Copy with `alpha` clamped to `[0, 1]`; the pipeline only ever
    /// blends with a clamped weight.
    pub fn clamped(mut self) -> Self {
        self.alpha = self.alpha.clamp(0.0, 1.0);
        self
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
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
