//! 管线配置：基础地址、超时、成功码、免提示白名单与登录跳转。
//!
//! Pipeline configuration.
//!
//! Loaded from YAML or built in code, then overridden from the environment:
//!
//! - `APP_API_BASE_URL`: base URL prepended to relative request paths
//! - `APP_HTTP_TIMEOUT_MS`: transport timeout (default 10000)
//! - `APP_LOGIN_PATH`: redirect target after an expired session (default `/login`)
//! - `APP_PROXY_URL`: optional HTTP proxy

use crate::classifier::{AllowList, DEFAULT_ALLOW_LIST};
use crate::envelope::SuccessCodes;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub success_codes: Vec<i64>,
    pub allow_list: Vec<String>,
    pub login_path: String,
    pub redirect_delay_ms: u64,
    pub default_headers: BTreeMap<String, String>,
    pub proxy_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
            success_codes: vec![0, 200],
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|s| s.to_string()).collect(),
            login_path: "/login".to_string(),
            redirect_delay_ms: 1_500,
            default_headers,
            proxy_url: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup (the environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("APP_API_BASE_URL").filter(|s| !s.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(ms) = lookup("APP_HTTP_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()) {
            self.timeout_ms = ms;
        }
        if let Some(path) = lookup("APP_LOGIN_PATH").filter(|s| !s.trim().is_empty()) {
            self.login_path = path;
        }
        if let Some(proxy) = lookup("APP_PROXY_URL").filter(|s| !s.trim().is_empty()) {
            self.proxy_url = Some(proxy);
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_success_codes(mut self, codes: Vec<i64>) -> Self {
        self.success_codes = codes;
        self
    }

    pub fn with_allow_list(mut self, patterns: Vec<String>) -> Self {
        self.allow_list = patterns;
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn success_code_set(&self) -> SuccessCodes {
        SuccessCodes::new(self.success_codes.iter().copied())
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allow_list.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(invalid("config.timeout_ms", "timeout must be greater than zero"));
        }
        if self.success_codes.is_empty() {
            return Err(invalid(
                "config.success_codes",
                "at least one success code is required",
            ));
        }
        if !self.login_path.starts_with('/') {
            return Err(invalid(
                "config.login_path",
                "login path must be an absolute path",
            ));
        }
        if !self.base_url.is_empty() {
            url::Url::parse(&self.base_url).map_err(|e| {
                Error::configuration_with_context(
                    "base URL is not a valid absolute URL",
                    ErrorContext::new()
                        .with_field_path("config.base_url")
                        .with_details(e.to_string())
                        .with_source("config_validator"),
                )
            })?;
        }
        Ok(())
    }
}

fn invalid(field: &str, msg: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config_validator"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_app_conventions() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.redirect_delay(), Duration::from_millis(1500));
        assert_eq!(cfg.login_path, "/login");
        assert!(cfg.success_code_set().contains(0));
        assert!(cfg.success_code_set().contains(200));
        assert!(cfg.allow_list().matches("/api/login"));
        assert_eq!(
            cfg.default_headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn overrides_apply_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("APP_API_BASE_URL", "https://api.example.com"),
            ("APP_HTTP_TIMEOUT_MS", "2500"),
            ("APP_LOGIN_PATH", "/auth/sign-in"),
        ]
        .into_iter()
        .collect();
        let cfg = PipelineConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.base_url, "https://api.example.com");
        assert_eq!(cfg.timeout_ms, 2500);
        assert_eq!(cfg.login_path, "/auth/sign-in");
        assert!(cfg.proxy_url.is_none());
    }

    #[test]
    fn unparsable_override_is_ignored() {
        let cfg = PipelineConfig::default()
            .with_overrides(|k| (k == "APP_HTTP_TIMEOUT_MS").then(|| "soon".to_string()));
        assert_eq!(cfg.timeout_ms, 10_000);
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let cfg = PipelineConfig::from_yaml_str(
            "base_url: https://api.example.com\nsuccess_codes: [0]\nallow_list: [\"/api/sso\"]\n",
        )
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.example.com");
        assert!(!cfg.success_code_set().contains(200));
        assert!(cfg.allow_list().matches("/api/sso/callback"));
        assert!(!cfg.allow_list().matches("/api/login"));
        assert_eq!(cfg.timeout_ms, 10_000);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero = PipelineConfig::default().with_timeout(Duration::ZERO);
        let err = zero.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("config.timeout_ms")
        );

        assert!(PipelineConfig::default()
            .with_success_codes(vec![])
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_login_path("login")
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_base_url("not a url")
            .validate()
            .is_err());
    }
}
