use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub search_resubmit: SearchResubmit,
    #[serde(default = "default_label_retry")]
    pub label_retry: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchResubmit {
    #[default]
    Refetch,
    Cached,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            page_size: DEFAULT_PAGE_SIZE,
            search_resubmit: SearchResubmit::default(),
            label_retry: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(config)
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_label_retry() -> bool {
    true
}

fn config_path() -> PathBuf {
    config_dir().join("vagas-tui").join("config.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&dir).to_path_buf();
    }

    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".config");
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
