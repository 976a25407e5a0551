use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use directories::BaseDirs;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::DatasetSlug;
use crate::error::FetchError;
use crate::fs_util::extract_zip;

pub const KAGGLE_API_URL: &str = "https://www.kaggle.com/api/v1";

/// Source of dataset archives.
pub trait KaggleClient {
    /// Downloads every file of `slug` into `destination` and unpacks the
    /// downloaded archive there.
    fn download_dataset(&self, slug: &DatasetSlug, destination: &Path) -> Result<(), FetchError>;
}

#[derive(Clone, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KaggleCredentials {
    /// Resolves credentials the way the Kaggle tooling does: `KAGGLE_USERNAME`
    /// and `KAGGLE_KEY` first, then `kaggle.json` in `$KAGGLE_CONFIG_DIR` or
    /// `~/.kaggle`.
    pub fn resolve() -> Result<Self, FetchError> {
        let config_dir = std::env::var_os("KAGGLE_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join(".kaggle")));
        Self::resolve_with(|name| std::env::var(name).ok(), config_dir.as_deref())
    }

    pub fn resolve_with<F>(lookup_env: F, config_dir: Option<&Path>) -> Result<Self, FetchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = lookup_env("KAGGLE_USERNAME")
            .zip(lookup_env("KAGGLE_KEY"))
            .filter(|(username, key)| !username.trim().is_empty() && !key.trim().is_empty());
        if let Some((username, key)) = from_env {
            debug!("using Kaggle credentials from environment");
            return Ok(Self {
                username: username.trim().to_string(),
                key: key.trim().to_string(),
            });
        }

        let Some(config_dir) = config_dir else {
            return Err(FetchError::MissingCredentials);
        };
        let path = config_dir.join("kaggle.json");
        if !path.exists() {
            return Err(FetchError::MissingCredentials);
        }
        debug!(path = %path.display(), "using Kaggle credentials file");
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let content =
            fs::read_to_string(path).map_err(|_| FetchError::CredentialsRead(path.to_path_buf()))?;
        let credentials: KaggleCredentials = serde_json::from_str(&content)
            .map_err(|err| FetchError::CredentialsParse(err.to_string()))?;
        if credentials.username.trim().is_empty() || credentials.key.trim().is_empty() {
            return Err(FetchError::CredentialsParse(
                "username and key must not be empty".to_string(),
            ));
        }
        Ok(credentials)
    }
}

#[derive(Clone)]
pub struct KaggleHttpClient {
    client: Client,
    base_url: String,
    credentials: KaggleCredentials,
}

impl KaggleHttpClient {
    pub fn new(credentials: KaggleCredentials) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fitabase-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::KaggleHttp(err.to_string()))?,
        );

        // archives can be large, so only the connect phase is bounded
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| FetchError::KaggleHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: KAGGLE_API_URL.to_string(),
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn download_url(&self, slug: &DatasetSlug) -> String {
        format!(
            "{}/datasets/download/{}/{}",
            self.base_url.trim_end_matches('/'),
            slug.owner(),
            slug.name()
        )
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &mut fs::File,
    ) -> Result<u64, FetchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::KaggleStatus {
                status: status.as_u16(),
                message: status_message(status, body),
            });
        }
        std::io::copy(&mut response, destination)
            .map_err(|err| FetchError::KaggleHttp(format!("reading response body: {err}")))
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, FetchError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(status, attempt, "retrying Kaggle request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(error = %err, attempt, "retrying Kaggle request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::KaggleHttp(err.to_string()));
                }
            }
        }
    }
}

impl KaggleClient for KaggleHttpClient {
    fn download_dataset(&self, slug: &DatasetSlug, destination: &Path) -> Result<(), FetchError> {
        let url = self.download_url(slug);
        fs::create_dir_all(destination).map_err(|err| {
            FetchError::Filesystem(format!("create {}: {err}", destination.display()))
        })?;

        info!(dataset = %slug, "requesting dataset archive");
        let response = self.send_with_retries(|| {
            self.client
                .get(&url)
                .basic_auth(&self.credentials.username, Some(&self.credentials.key))
        })?;

        let mut archive = tempfile::Builder::new()
            .prefix(slug.name())
            .suffix(".zip")
            .tempfile_in(destination)
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let bytes = self.write_response_to_file(response, archive.as_file_mut())?;
        info!(dataset = %slug, bytes, "download finished, unpacking");

        extract_zip(archive.path(), destination)?;
        archive
            .close()
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

fn status_message(status: StatusCode, body: String) -> String {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            "authentication failed; check your Kaggle username and key".to_string()
        }
        StatusCode::NOT_FOUND => "dataset not found".to_string(),
        _ if body.trim().is_empty() => "Kaggle request failed".to_string(),
        _ => body,
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
