// src/config/mod.rs
//! Application configuration: TOML file + env-resolved secrets.
//!
//! Lookup order:
//! 1) `$PULSE_CONFIG_PATH` (must exist)
//! 2) `config/app.toml`
//! 3) built-in defaults
//!
//! Secret fields holding the literal `"ENV"` are read from the environment.
//! Their contents are never inspected, only passed to the collaborator.

pub mod app;

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use app::{
    AnalysisConfig, AppConfig, BackendKind, ClassifierKind, FixtureConfig, GatewayConfig,
    NitterConfig, RemoteClassifierConfig, RetrievalConfig, SentimentConfig,
};

pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_GATEWAY_TOKEN: &str = "PULSE_GATEWAY_TOKEN";
pub const ENV_SENTIMENT_TOKEN: &str = "SENTIMENT_API_TOKEN";

pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    parse(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub fn load_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        return load_from(&pb);
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return load_from(&default);
    }
    let mut cfg = AppConfig::default();
    cfg.sanitize();
    Ok(cfg)
}

pub fn parse(s: &str) -> Result<AppConfig> {
    let mut cfg: AppConfig = toml::from_str(s)?;
    cfg.sanitize();
    resolve_secrets(&mut cfg)?;
    Ok(cfg)
}

fn resolve_secrets(cfg: &mut AppConfig) -> Result<()> {
    if let Some(g) = cfg.retrieval.gateway.as_mut() {
        g.token = resolve_secret(g.token.take(), ENV_GATEWAY_TOKEN)?;
    }
    if let Some(r) = cfg.sentiment.remote.as_mut() {
        r.api_token = resolve_secret(r.api_token.take(), ENV_SENTIMENT_TOKEN)?;
    }
    Ok(())
}

/// `"ENV"` (any case) means: read `env_key`, which must then be set.
fn resolve_secret(value: Option<String>, env_key: &str) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().eq_ignore_ascii_case("env") => std::env::var(env_key)
            .map(Some)
            .map_err(|_| anyhow!("Missing {env_key} env var")),
        Some(v) if v.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.analysis.max_results, 200);
        assert_eq!(cfg.retrieval.backend, BackendKind::Nitter);
        assert_eq!(cfg.sentiment.classifier, ClassifierKind::Lexicon);
        assert!(!cfg.retrieval.nitter.instances.is_empty());
        assert!(cfg.query.language.is_none());
    }

    #[test]
    fn sanitize_fixes_zeroes_and_trailing_slashes() {
        let cfg = parse(
            r#"
[analysis]
max_results = 0
retrieval_timeout_secs = 0

[query]
language = " ES "

[retrieval.nitter]
instances = ["https://nitter.example/", "  "]
"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.max_results, 200);
        assert_eq!(cfg.analysis.retrieval_timeout_secs, 30);
        assert_eq!(cfg.query.language.as_deref(), Some("es"));
        assert_eq!(cfg.retrieval.nitter.instances, vec!["https://nitter.example"]);
    }

    #[serial_test::serial]
    #[test]
    fn env_secret_is_resolved_or_reported() {
        let toml = r#"
[retrieval]
backend = "gateway"

[retrieval.gateway]
endpoint = "http://127.0.0.1:9/search"
token = "ENV"
"#;
        env::remove_var(ENV_GATEWAY_TOKEN);
        let err = parse(toml).unwrap_err();
        assert!(err.to_string().contains(ENV_GATEWAY_TOKEN));

        env::set_var(ENV_GATEWAY_TOKEN, "s3cret");
        let cfg = parse(toml).unwrap();
        assert_eq!(
            cfg.retrieval.gateway.unwrap().token.as_deref(),
            Some("s3cret")
        );
        env::remove_var(ENV_GATEWAY_TOKEN);
    }
}
