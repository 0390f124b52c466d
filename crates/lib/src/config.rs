//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.counselor-relay/config.json`) and environment.
//! Everything here is fixed at deployment time; nothing is reconfigured while serving.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dialogflow::SessionPath;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Destination counselor agent (session, intent, credentials).
    #[serde(default)]
    pub counselor: CounselorConfig,

    /// Reply texts returned to the client agent.
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Webhook bind, port, path and auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the HTTP server (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Route the platform posts fulfillment requests to (default "/webhook").
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Auth settings. When absent, defaults to no auth for loopback bind.
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

/// Webhook auth: token or none (loopback-only when none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    /// "none" = no shared secret (only safe when bind is loopback). "token" = require `Authorization: Bearer <token>`.
    #[serde(default)]
    pub mode: GatewayAuthMode,

    /// Shared secret sent by the platform as a custom webhook header. Overridden by RELAY_WEBHOOK_TOKEN env.
    /// Never written back out when the config is serialized.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    /// No auth; allow only when bind is loopback.
    #[default]
    None,

    /// Require the bearer token to match the configured token.
    Token,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            webhook_path: default_webhook_path(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

/// The counselor agent the relay forwards to. One relay process talks to exactly one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorConfig {
    /// GCP project that hosts the counselor agent.
    #[serde(default = "default_counselor_project")]
    pub project_id: String,

    /// Durable session id on the counselor agent; pre-provisioned, never created here.
    #[serde(default = "default_counselor_session")]
    pub session_id: String,

    /// Intent the counselor agent is told to treat forwarded messages as.
    #[serde(default = "default_counselor_intent")]
    pub intent: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Service-account JSON for the counselor project. Overridden by COUNSELOR_CREDENTIALS_PATH env.
    /// Relative paths are resolved against the config file's parent.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// API base URL (default https://dialogflow.googleapis.com). Point at an emulator for local testing.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Timeout for a single outbound call, in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_counselor_project() -> String {
    "counselor-xibw".to_string()
}

fn default_counselor_session() -> String {
    "counselor1".to_string()
}

fn default_counselor_intent() -> String {
    crate::fulfillment::HANDLE_CLIENT_MESSAGE.to_string()
}

fn default_language_code() -> String {
    crate::dialogflow::DEFAULT_LANGUAGE_CODE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CounselorConfig {
    fn default() -> Self {
        Self {
            project_id: default_counselor_project(),
            session_id: default_counselor_session(),
            intent: default_counselor_intent(),
            language_code: default_language_code(),
            credentials_path: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CounselorConfig {
    pub fn session_path(&self) -> SessionPath {
        SessionPath::new(self.project_id.trim(), self.session_id.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Texts written back to the client agent after a relay attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    #[serde(default = "default_ack_message")]
    pub ack_message: String,

    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

fn default_ack_message() -> String {
    crate::fulfillment::ACK_MESSAGE.to_string()
}

fn default_failure_message() -> String {
    crate::fulfillment::FAILURE_MESSAGE.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ack_message: default_ack_message(),
            failure_message: default_failure_message(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the webhook token: env RELAY_WEBHOOK_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<SecretString> {
    non_empty_env("RELAY_WEBHOOK_TOKEN")
        .map(SecretString::from)
        .or_else(|| {
            config
                .gateway
                .auth
                .token
                .as_ref()
                .map(|s| s.expose_secret().trim())
                .filter(|s| !s.is_empty())
                .map(SecretString::from)
        })
}

/// When auth mode is token and a token is configured, returns it for webhook validation.
pub fn require_webhook_token(config: &Config) -> Option<SecretString> {
    if config.gateway.auth.mode == GatewayAuthMode::Token {
        resolve_gateway_token(config)
    } else {
        None
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve the counselor service-account path: env COUNSELOR_CREDENTIALS_PATH overrides config.
/// Relative config paths are resolved against the config file's parent.
pub fn resolve_credentials_path(config: &Config, config_path: &Path) -> Option<PathBuf> {
    if let Some(p) = non_empty_env("COUNSELOR_CREDENTIALS_PATH") {
        return Some(PathBuf::from(p));
    }
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match &config.counselor.credentials_path {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                Some(p.clone())
            } else {
                Some(config_parent.join(p))
            }
        }
        _ => None,
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".counselor-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path). Missing file => default config.
/// Returns the config and the path that was used (for resolving relative credential paths).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_bind_and_path() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8080);
        assert_eq!(g.bind, "127.0.0.1");
        assert_eq!(g.webhook_path, "/webhook");
        assert_eq!(g.auth.mode, GatewayAuthMode::None);
    }

    #[test]
    fn default_counselor_targets_fixed_session() {
        let c = CounselorConfig::default();
        assert_eq!(
            c.session_path().to_string(),
            "projects/counselor-xibw/agent/sessions/counselor1"
        );
        assert_eq!(c.intent, "HandleClientMessage");
        assert_eq!(c.language_code, "ko");
        assert_eq!(c.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_object_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.relay.ack_message, "상담사에게 메시지를 전달했습니다.");
        assert_eq!(
            config.relay.failure_message,
            "Counselor에게 메시지를 전달하는 데 실패했습니다."
        );
    }

    #[test]
    fn camel_case_keys_are_read() {
        let config: Config = serde_json::from_str(
            r#"{
                "gateway": { "port": 9000, "webhookPath": "/fulfillment", "auth": { "mode": "token", "token": " s3cret " } },
                "counselor": { "projectId": "other", "sessionId": "desk-2", "languageCode": "en", "timeoutSecs": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.webhook_path, "/fulfillment");
        assert_eq!(config.gateway.auth.mode, GatewayAuthMode::Token);
        assert_eq!(
            config.counselor.session_path().to_string(),
            "projects/other/agent/sessions/desk-2"
        );
        assert_eq!(config.counselor.language_code, "en");
        assert_eq!(config.counselor.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let mut c = CounselorConfig::default();
        c.timeout_secs = 0;
        assert_eq!(c.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" ::1 "));
        assert!(is_loopback_bind("localhost"));
        assert!(!is_loopback_bind("0.0.0.0"));
    }

    #[test]
    fn webhook_token_only_required_in_token_mode() {
        let mut config = Config::default();
        config.gateway.auth.token = Some(SecretString::from(" abc "));
        if std::env::var("RELAY_WEBHOOK_TOKEN").is_err() {
            assert!(require_webhook_token(&config).is_none());
            config.gateway.auth.mode = GatewayAuthMode::Token;
            let token = require_webhook_token(&config).unwrap();
            assert_eq!(token.expose_secret(), "abc");
        }
    }

    #[test]
    fn webhook_token_stays_out_of_debug_and_serialized_config() {
        let config: Config = serde_json::from_str(
            r#"{ "gateway": { "auth": { "mode": "token", "token": "hook-s3cret-value" } } }"#,
        )
        .unwrap();
        assert_eq!(
            config.gateway.auth.token.as_ref().unwrap().expose_secret(),
            "hook-s3cret-value"
        );
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("hook-s3cret-value"));
        let written = serde_json::to_string(&config).unwrap();
        assert!(!written.contains("hook-s3cret-value"));
    }

    #[test]
    fn credentials_path_relative_to_config_dir() {
        if std::env::var("COUNSELOR_CREDENTIALS_PATH").is_ok() {
            return;
        }
        let mut config = Config::default();
        let path = Path::new("/home/user/.counselor-relay/config.json");
        assert_eq!(resolve_credentials_path(&config, path), None);

        config.counselor.credentials_path = Some(PathBuf::from("counselor-key.json"));
        assert_eq!(
            resolve_credentials_path(&config, path),
            Some(PathBuf::from("/home/user/.counselor-relay/counselor-key.json"))
        );

        config.counselor.credentials_path = Some(PathBuf::from("/etc/relay/key.json"));
        assert_eq!(
            resolve_credentials_path(&config, path),
            Some(PathBuf::from("/etc/relay/key.json"))
        );
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("relay-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 8080);
    }
}
