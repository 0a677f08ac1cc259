//! The fetch step: one HTTP GET, persisted into raw storage.
//!
//! Configuration is passed in explicitly as a [`FetchConfig`]; nothing here
//! reads the environment.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use reqwest::Url;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// File name used when the URL has no usable last path segment.
pub const FALLBACK_FILE_NAME: &str = "downloaded_data";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    pub source_url: Option<String>,
    pub raw_dir: PathBuf,
}

/// Derive the destination file name from the last path segment of `url`.
/// The query string and fragment never contribute.
///
/// ```
/// use reqwest::Url;
/// use sluice_fetch::file_name_from_url;
///
/// let url = Url::parse("https://github.com/org/repo/raw/main/data.zip?raw=true").unwrap();
/// assert_eq!(file_name_from_url(&url), "data.zip");
/// ```
#[must_use]
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download the configured URL into `raw_dir`, creating the directory if
    /// needed and overwriting any earlier download of the same name.
    ///
    /// Returns the path written.
    #[instrument(skip_all, fields(url, path))]
    pub fn fetch(&self, config: &FetchConfig) -> Result<PathBuf> {
        let source = config
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_raise(|| ErrorKind::MissingSourceUrl)?;
        let url = Url::parse(source).or_raise(|| ErrorKind::InvalidUrl(source.to_string()))?;
        tracing::Span::current().record("url", url.as_str());

        fs::create_dir_all(&config.raw_dir).or_raise(|| ErrorKind::Write(config.raw_dir.clone()))?;
        let path = config.raw_dir.join(file_name_from_url(&url));
        tracing::Span::current().record("path", tracing::field::display(path.display()));

        tracing::info!("Downloading");
        let mut response = self.client.get(url.clone()).send().or_raise(|| ErrorKind::Request(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let bytes = write_body(&mut response, &path)?;
        tracing::info!(bytes, "Data saved");
        Ok(path)
    }
}

fn write_body(response: &mut reqwest::blocking::Response, path: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path).or_raise(|| ErrorKind::Write(path.to_path_buf()))?);
    let url = response.url().to_string();
    let bytes = response.copy_to(&mut writer).or_raise(|| ErrorKind::Request(url))?;
    writer.flush().or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    Ok(bytes)
}

/// Fetch with a default client.
pub fn fetch(config: &FetchConfig) -> Result<PathBuf> {
    Fetcher::new()?.fetch(config)
}
