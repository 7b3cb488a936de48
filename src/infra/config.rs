use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://solved.ac/api/v3";
pub const DEFAULT_LANGUAGE: &str = "ko";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the shared solved.ac client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            language: DEFAULT_LANGUAGE.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RemoteSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }
}

pub struct Config {
    pub mode: String, // "stdio" or "server"
    pub port: u16,
    pub remote: RemoteSettings,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    solvedac: FileRemote,
}

#[derive(Debug, Default, Deserialize)]
struct FileRemote {
    base_url: Option<String>,
    language: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Defaults, then the TOML file named by `SOLVEDAC_CONFIG`, then env vars.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut remote = RemoteSettings::default();

        if let Ok(path) = std::env::var("SOLVEDAC_CONFIG") {
            if !path.trim().is_empty() {
                let file = load_file(Path::new(&path))?;
                if let Some(v) = file.solvedac.base_url {
                    remote.base_url = v;
                }
                if let Some(v) = file.solvedac.language {
                    remote.language = v;
                }
                if let Some(v) = file.solvedac.timeout_secs {
                    remote.timeout_secs = v;
                }
            }
        }

        if let Ok(v) = std::env::var("SOLVEDAC_BASE_URL") {
            remote.base_url = v;
        }
        if let Ok(v) = std::env::var("SOLVEDAC_LANGUAGE") {
            remote.language = v;
        }
        if let Some(v) = std::env::var("SOLVEDAC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            remote.timeout_secs = v;
        }

        let mode = std::env::var("MODE").unwrap_or_else(|_| "stdio".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self { mode, port, remote })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            bail!("Invalid MODE: {}. Must be 'server' or 'stdio'", self.mode);
        }
        if self.mode == "server" && self.port == 0 {
            bail!("PORT cannot be 0");
        }
        if self.remote.base_url.trim().is_empty() {
            bail!("SOLVEDAC_BASE_URL cannot be empty");
        }
        url::Url::parse(&self.remote.base_url)
            .with_context(|| format!("SOLVEDAC_BASE_URL is not a valid URL: {}", self.remote.base_url))?;
        if self.remote.timeout_secs == 0 {
            bail!("SOLVEDAC_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}
