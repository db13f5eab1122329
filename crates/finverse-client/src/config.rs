//! Client configuration
//!
//! Loaded from a TOML file or built in code. The client secret is never read
//! from the TOML itself: it comes from the FINVERSE_CLIENT_SECRET env var or
//! from `client_secret_file`. The configuration is frozen once a client is built.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use finverse_auth::{DEFAULT_REFRESH_SKEW, SANDBOX_BASE_URL};
use serde::Deserialize;

/// Env var holding the client secret
pub const CLIENT_SECRET_ENV: &str = "FINVERSE_CLIENT_SECRET";

/// Env var naming the config file
pub const CONFIG_PATH_ENV: &str = "FINVERSE_CONFIG";

/// Settings needed to construct a `FinverseClient`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub customer_app_id: String,
    #[serde(skip)]
    client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Required by the link-token and authorization-code operations only
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_skew")]
    pub refresh_skew_secs: u64,
}

fn default_base_url() -> String {
    SANDBOX_BASE_URL.to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_skew() -> u64 {
    DEFAULT_REFRESH_SKEW.as_secs()
}

impl ClientConfig {
    /// Configuration for the sandbox environment with default timeouts.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret<String>>,
        customer_app_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            customer_app_id: customer_app_id.into(),
            client_secret: Some(client_secret.into()),
            client_secret_file: None,
            base_url: default_base_url(),
            redirect_uri: None,
            timeout_secs: default_timeout(),
            refresh_skew_secs: default_refresh_skew(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew_secs = skew.as_secs();
        self
    }

    /// Load configuration from a TOML file, then resolve the client secret.
    ///
    /// Secret resolution order:
    /// 1. FINVERSE_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = toml::from_str(&contents)?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            config.client_secret = Some(Secret::new(secret.trim().to_owned()));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings a client cannot work without.
    pub fn validate(&self) -> common::Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(common::Error::Missing("client_id"));
        }
        if self.customer_app_id.trim().is_empty() {
            return Err(common::Error::Missing("customer_app_id"));
        }
        match &self.client_secret {
            Some(secret) if !secret.is_blank() => {}
            _ => return Err(common::Error::Missing("client_secret")),
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn client_secret(&self) -> Option<&Secret<String>> {
        self.client_secret.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_skew(&self) -> Duration {
        Duration::from_secs(self.refresh_skew_secs)
    }

    /// Resolve config file path from CLI arg or FINVERSE_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from("finverse.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("finverse.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    const MINIMAL: &str = r#"
client_id = "client-1"
customer_app_id = "app-1"
"#;

    #[test]
    fn defaults_apply_to_minimal_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, MINIMAL);

        unsafe { set_env(CLIENT_SECRET_ENV, "secret-env") };
        let config = ClientConfig::load(&path).unwrap();
        unsafe { remove_env(CLIENT_SECRET_ENV) };

        assert_eq!(config.client_id, "client-1");
        assert_eq!(config.customer_app_id, "app-1");
        assert_eq!(config.base_url, "https://api.sandbox.finverse.net");
        assert_eq!(config.redirect_uri, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_skew(), Duration::from_secs(300));
        assert_eq!(config.client_secret().unwrap().expose(), "secret-env");
    }

    #[test]
    fn secret_from_file_is_trimmed() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "secret-file\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{MINIMAL}client_secret_file = \"{}\"\nredirect_uri = \"https://app.test/cb\"\n",
                secret_path.display()
            ),
        );

        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let config = ClientConfig::load(&path).unwrap();

        assert_eq!(config.client_secret().unwrap().expose(), "secret-file");
        assert_eq!(config.redirect_uri.as_deref(), Some("https://app.test/cb"));
    }

    #[test]
    fn env_secret_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "secret-file").unwrap();
        let path = write_config(
            &dir,
            &format!("{MINIMAL}client_secret_file = \"{}\"\n", secret_path.display()),
        );

        unsafe { set_env(CLIENT_SECRET_ENV, "secret-env") };
        let config = ClientConfig::load(&path);
        unsafe { remove_env(CLIENT_SECRET_ENV) };

        assert_eq!(config.unwrap().client_secret().unwrap().expose(), "secret-env");
    }

    #[test]
    fn missing_secret_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, MINIMAL);

        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let err = ClientConfig::load(&path).unwrap_err();
        assert!(
            matches!(err, common::Error::Missing("client_secret")),
            "got: {err}"
        );
    }

    #[test]
    fn unreadable_secret_file_is_config_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!("{MINIMAL}client_secret_file = \"/nonexistent/secret\"\n"),
        );

        unsafe { remove_env(CLIENT_SECRET_ENV) };
        let err = ClientConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("client_secret_file"), "got: {err}");
    }

    #[test]
    fn missing_file_and_bad_toml_are_errors() {
        assert!(matches!(
            ClientConfig::load(Path::new("/nonexistent/finverse.toml")),
            Err(common::Error::Io(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "client_id = {{{{");
        assert!(matches!(
            ClientConfig::load(&path),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn missing_required_field_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"client_id = "client-1""#);
        assert!(matches!(
            ClientConfig::load(&path),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = ClientConfig::new("client-1", "secret-1", "app-1");
        assert!(base.validate().is_ok());

        let err = base.clone().with_base_url("ftp://api.test").validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let err = base
            .clone()
            .with_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        let err = ClientConfig::new("", "secret-1", "app-1").validate().unwrap_err();
        assert!(matches!(err, common::Error::Missing("client_id")));

        let err = ClientConfig::new("client-1", "  ", "app-1").validate().unwrap_err();
        assert!(matches!(err, common::Error::Missing("client_secret")));

        let err = ClientConfig::new("client-1", "secret-1", "").validate().unwrap_err();
        assert!(matches!(err, common::Error::Missing("customer_app_id")));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = ClientConfig::new("client-1", "super-secret", "app-1");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(CONFIG_PATH_ENV, "/etc/finverse/env.toml") };
        assert_eq!(
            ClientConfig::resolve_path(Some("cli.toml")),
            PathBuf::from("cli.toml")
        );
        assert_eq!(
            ClientConfig::resolve_path(None),
            PathBuf::from("/etc/finverse/env.toml")
        );
        unsafe { remove_env(CONFIG_PATH_ENV) };
        assert_eq!(
            ClientConfig::resolve_path(None),
            PathBuf::from("finverse.toml")
        );
    }
}
