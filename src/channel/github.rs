use async_trait::async_trait;
use reqwest::{header, Url};
use serde::Deserialize;

use crate::channel::{error, Channel, Outcome, Reading};
use crate::error::{Result, UpdaterError};
use crate::http::{status_ok, HttpClient};
use crate::update::Update;
use crate::version::Version;

/// Host to contact.
const HOST: &str = "https://api.github.com";

/// One release as returned by the releases-list endpoint, newest first.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    name: String,
    tag_name: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    browser_download_url: String,
}

/// Channel reading the latest release of a GitHub repository.
pub struct GithubChannel {
    repository: String,
    base: Url,
}

impl GithubChannel {
    /// Create a channel for `owner/repo`.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            base: Url::parse(HOST).expect("default github api url"),
        }
    }

    /// Point the channel at an alternate API host.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    fn releases_url(&self) -> Result<Url> {
        let path = format!("repos/{}/releases", self.repository);
        self.base
            .join(&path)
            .map_err(|_| UpdaterError::InvalidUrl(path))
    }

    async fn latest_release(&self, http: &HttpClient) -> Result<Reading> {
        let response = http
            .get(self.releases_url()?)
            .header(header::ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        if !status_ok(status) {
            return Err(UpdaterError::Status(status));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok((Outcome::RepoNoReleases, None));
        }

        let releases: Vec<GithubRelease> = serde_json::from_str(&body)?;
        // The API returns newest first.
        let Some(release) = releases.first() else {
            return Ok((Outcome::RepoNoReleases, None));
        };
        if release.assets.is_empty() {
            return Ok((Outcome::RepoNoReleases, None));
        }

        // A malformed tag is a terminal parse failure for this poll, not
        // something a retry can fix.
        let version = Version::parse(&release.tag_name)
            .ok_or_else(|| UpdaterError::InvalidVersion(release.tag_name.clone()))?;
        let download_url = Url::parse(&release.assets[0].browser_download_url)
            .map_err(|_| UpdaterError::InvalidUrl(release.assets[0].browser_download_url.clone()))?;

        let mut update = Update::new(&release.name, Some(version)).with_download_url(download_url);
        if let Some(notes) = &release.body {
            update = update.with_description(notes);
        }

        Ok((Outcome::Success, Some(update)))
    }
}

#[async_trait]
impl Channel for GithubChannel {
    async fn read(&self, http: &HttpClient) -> Reading {
        match self.latest_release(http).await {
            Ok(reading) => reading,
            Err(err) => {
                tracing::debug!(repository = %self.repository, %err, "github channel read failed");
                error()
            }
        }
    }
}
