use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{errors::Error, Result};

/// Typed configuration, loaded from a YAML file at startup.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub client: ClientConfig,
    pub bot: BotConfig,
    pub filter_regex: String,
}

/// Settings for the user-account client (TDLib session).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub phone: String,
    pub system_language_code: String,
    pub system_version: String,
    pub device_model: String,
    pub application_version: String,
    pub files_directory: String,
    pub database_directory: String,
    #[serde(default)]
    pub use_file_database: bool,
    #[serde(default)]
    pub check_code: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub token: String,
    #[serde(default = "default_bot_timeout")]
    pub timeout: u64,
}

impl BotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

fn default_bot_timeout() -> u64 {
    30
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("config parse failed: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to open {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.client.api_id == 0 {
            return Err(Error::Config("client.apiId is required".to_string()));
        }
        if self.client.api_hash.trim().is_empty() {
            return Err(Error::Config("client.apiHash is required".to_string()));
        }
        if self.client.phone.trim().is_empty() {
            return Err(Error::Config("client.phone is required".to_string()));
        }
        if self.bot.token.trim().is_empty() {
            return Err(Error::Config("bot.token is required".to_string()));
        }
        if self.filter_regex.trim().is_empty() {
            return Err(Error::Config("filterRegex is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
client:
  apiId: 12345
  apiHash: "abcdef"
  phone: "+10000000000"
  systemLanguageCode: "en"
  systemVersion: "Linux"
  deviceModel: "Server"
  applicationVersion: "0.1.0"
  filesDirectory: "/tmp/tgr/files"
  databaseDirectory: "/tmp/tgr/db"
  useFileDatabase: true
  checkCode: "54321"
  password: "hunter2"
  proxy:
    host: "127.0.0.1"
    port: 1080
    login: "user"
    password: "pass"
bot:
  token: "123:token"
  timeout: 15
filterRegex: "(?i)urgent"
"#;

    #[test]
    fn full_config_parses() {
        let cfg = Config::from_yaml(FULL).unwrap();
        assert_eq!(cfg.client.api_id, 12345);
        assert_eq!(cfg.client.phone, "+10000000000");
        assert!(cfg.client.use_file_database);
        let proxy = cfg.client.proxy.unwrap();
        assert_eq!(proxy.host, "127.0.0.1");
        assert_eq!(proxy.port, 1080);
        assert_eq!(cfg.bot.timeout(), Duration::from_secs(15));
        assert_eq!(cfg.filter_regex, "(?i)urgent");
    }

    #[test]
    fn proxy_and_secrets_are_optional() {
        let yaml = r#"
client:
  apiId: 1
  apiHash: "h"
  phone: "+1"
  systemLanguageCode: "en"
  systemVersion: "Linux"
  deviceModel: "Server"
  applicationVersion: "0.1.0"
  filesDirectory: "/tmp/f"
  databaseDirectory: "/tmp/d"
bot:
  token: "t"
filterRegex: ".*"
"#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert!(cfg.client.proxy.is_none());
        assert_eq!(cfg.client.check_code, "");
        assert_eq!(cfg.client.password, "");
        assert_eq!(cfg.bot.timeout, 30);
    }

    #[test]
    fn empty_filter_regex_is_rejected() {
        let yaml = FULL.replace(r#"filterRegex: "(?i)urgent""#, r#"filterRegex: """#);
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
