use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dahua-login")
        .join("config.toml")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// `http://192.168.1.108` or a bare host; a trailing slash is ignored.
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_login_path() -> String {
    "/RPC2_Login".to_string()
}

fn default_rpc_path() -> String {
    "/RPC2".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            login_path: default_login_path(),
            rpc_path: default_rpc_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DeviceConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty()
    }

    /// Host with scheme, without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url(), self.login_path)
    }

    pub fn rpc_url(&self) -> String {
        format!("{}{}", self.base_url(), self.rpc_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let text = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&text)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.device.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(host: &str) -> DeviceConfig {
        DeviceConfig {
            host: host.to_string(),
            username: "admin".to_string(),
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn defaults_point_at_login_endpoint() {
        let d = DeviceConfig::default();
        assert_eq!(d.login_path, "/RPC2_Login");
        assert_eq!(d.rpc_path, "/RPC2");
        assert_eq!(d.timeout(), Duration::from_secs(10));
        assert!(!d.is_configured());
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        assert_eq!(device("http://cam.lab/").base_url(), "http://cam.lab");
    }

    #[test]
    fn base_url_adds_scheme_to_bare_host() {
        assert_eq!(device("192.168.1.108").base_url(), "http://192.168.1.108");
    }

    #[test]
    fn base_url_keeps_https() {
        assert_eq!(device("https://nvr.example").base_url(), "https://nvr.example");
    }

    #[test]
    fn login_and_rpc_urls() {
        let d = device("http://cam.lab");
        assert_eq!(d.login_url(), "http://cam.lab/RPC2_Login");
        assert_eq!(d.rpc_url(), "http://cam.lab/RPC2");
    }

    #[test]
    fn load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(!config.is_configured());
    }

    #[test]
    fn save_then_load_preserves_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            device: DeviceConfig {
                password: "Minhmeo75321@".to_string(),
                timeout_secs: 3,
                ..device("http://cam.lab")
            },
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.is_configured());
        assert_eq!(loaded.device.host, "http://cam.lab");
        assert_eq!(loaded.device.password, "Minhmeo75321@");
        assert_eq!(loaded.device.timeout_secs, 3);
    }

    #[test]
    fn partial_device_table_fills_defaults() {
        let text = r#"
[device]
host = "10.0.0.5"
username = "admin"
password = "pw"
"#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.device.login_path, "/RPC2_Login");
        assert_eq!(config.device.timeout_secs, 10);
    }
}
