use std::fmt;

use anyhow::Result;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

mod issues;
mod search;
mod types;

pub use types::*;

const API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
pub const REPO_OWNER: &str = "frontendbr";
pub const REPO_NAME: &str = "vagas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Http(u16),
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(message) => write!(f, "network error: {}", message),
            FetchError::Http(status) => write!(f, "unexpected status {}", status),
            FetchError::Parse(message) => write!(f, "malformed payload: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    fn from_send(error: reqwest::Error) -> Self {
        FetchError::Network(error.to_string())
    }

    fn from_read(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return FetchError::Parse(error.to_string());
        }
        FetchError::Network(error.to_string())
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("vagas-tui"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(FetchError::Http(status.as_u16()))
    }
}
