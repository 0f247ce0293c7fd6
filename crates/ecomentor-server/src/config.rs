use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEFAULT_MENTOR_URL: &str = "https://apifreellm.com/api/chat";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub catalog_path: Option<PathBuf>,
    pub mentor_url: String,
    pub mentor_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("ECOMENTOR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ECOMENTOR_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("ECOMENTOR_PORT", "3000")
            .parse()
            .context("ECOMENTOR_PORT must be a port number")?;
        let timeout_secs: u64 = var("ECOMENTOR_MENTOR_TIMEOUT_SECS", "15")
            .parse()
            .context("ECOMENTOR_MENTOR_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            host: var("ECOMENTOR_HOST", "0.0.0.0"),
            port,
            db_path: var("ECOMENTOR_DB_PATH", "ecomentor.db").into(),
            jwt_secret,
            catalog_path: lookup("ECOMENTOR_CATALOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            mentor_url: var("ECOMENTOR_MENTOR_URL", DEFAULT_MENTOR_URL),
            mentor_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("ECOMENTOR_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("ecomentor.db"));
        assert_eq!(cfg.catalog_path, None);
        assert_eq!(cfg.mentor_url, DEFAULT_MENTOR_URL);
        assert_eq!(cfg.mentor_timeout, Duration::from_secs(15));
        assert_eq!(cfg.addr().unwrap().port(), 3000);
    }

    #[test]
    fn secret_is_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("ECOMENTOR_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("ECOMENTOR_JWT_SECRET", "a-real-secret"),
            ("ECOMENTOR_HOST", "127.0.0.1"),
            ("ECOMENTOR_PORT", "8080"),
            ("ECOMENTOR_CATALOG_PATH", "data/challenges.json"),
            ("ECOMENTOR_MENTOR_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.catalog_path, Some(PathBuf::from("data/challenges.json")));
        assert_eq!(cfg.mentor_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_are_errors() {
        assert!(config(&[("ECOMENTOR_JWT_SECRET", "s3cret"), ("ECOMENTOR_PORT", "http")]).is_err());
        assert!(
            config(&[
                ("ECOMENTOR_JWT_SECRET", "s3cret"),
                ("ECOMENTOR_MENTOR_TIMEOUT_SECS", "-1"),
            ])
            .is_err()
        );
    }
}
