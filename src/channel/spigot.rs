use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use serde::Deserialize;

use crate::channel::{error, Channel, Outcome, Reading};
use crate::error::{Result, UpdaterError};
use crate::http::{status_ok, HttpClient};
use crate::update::Update;
use crate::version::Version;

/// API host serving resource metadata.
const SPIGET_HOST: &str = "http://api.spiget.org";

/// Site host the relative file URL fragment is resolved against.
const SPIGOT_HOST: &str = "http://www.spigotmc.org";

#[derive(Debug, Deserialize)]
struct Resource {
    name: String,
    file: ResourceFile,
}

#[derive(Debug, Deserialize)]
struct ResourceFile {
    url: String,
}

#[derive(Debug, Deserialize)]
struct LatestVersion {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LatestUpdate {
    description: String,
}

/// Channel resolving a spigot resource through three dependent calls:
/// resource metadata, latest version, latest changelog. Any failing step
/// halts the pipeline and its outcome becomes the channel's outcome;
/// later steps never run.
pub struct SpigotChannel {
    resource_id: String,
    api_base: Url,
    download_base: Url,
}

impl SpigotChannel {
    /// Create a channel for a spigot resource id.
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            api_base: Url::parse(SPIGET_HOST).expect("default spiget api url"),
            download_base: Url::parse(SPIGOT_HOST).expect("default spigot site url"),
        }
    }

    /// Point the channel at an alternate API host.
    pub fn with_api_base_url(mut self, base: Url) -> Self {
        self.api_base = base;
        self
    }

    /// Resolve relative file URLs against an alternate host.
    pub fn with_download_base_url(mut self, base: Url) -> Self {
        self.download_base = base;
        self
    }

    fn api_url(&self, suffix: &str) -> Result<Url> {
        let path = format!("v2/resources/{}{}", self.resource_id, suffix);
        self.api_base
            .join(&path)
            .map_err(|_| UpdaterError::InvalidUrl(path))
    }

    /// Step 1: resource metadata gives the title and a relative file URL;
    /// the version is still unknown at this point.
    async fn resource(&self, http: &HttpClient) -> Result<Reading> {
        let response = http.fetch(self.api_url("")?).await?;
        let status = response.status();
        if !status_ok(status) {
            return Err(UpdaterError::Status(status));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok((Outcome::RepoNoReleases, None));
        }

        let resource: Resource = serde_json::from_str(&body)?;
        let download_url = self
            .download_base
            .join(&resource.file.url)
            .map_err(|_| UpdaterError::InvalidUrl(resource.file.url.clone()))?;

        let update = Update::new(resource.name, None).with_download_url(download_url);
        Ok((Outcome::Success, Some(update)))
    }

    /// Step 2: fill in the version parsed from the latest-version name.
    async fn latest_version(&self, http: &HttpClient, update: &mut Update) -> Result<Outcome> {
        let response = http.fetch(self.api_url("/versions/latest")?).await?;
        let status = response.status();
        if !status_ok(status) {
            return Err(UpdaterError::Status(status));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Outcome::RepoNoReleases);
        }

        let latest: LatestVersion = serde_json::from_str(&body)?;
        let version =
            Version::parse(&latest.name).ok_or_else(|| UpdaterError::InvalidVersion(latest.name.clone()))?;
        update.set_version(version);
        Ok(Outcome::Success)
    }

    /// Step 3: fill in the changelog. An empty body is fine here; the
    /// update simply keeps no description.
    async fn latest_update(&self, http: &HttpClient, update: &mut Update) -> Result<Outcome> {
        let response = http.fetch(self.api_url("/updates/latest")?).await?;
        let status = response.status();
        if !status_ok(status) {
            return Err(UpdaterError::Status(status));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Outcome::Success);
        }

        let latest: LatestUpdate = serde_json::from_str(&body)?;
        let decoded = STANDARD.decode(latest.description.as_bytes())?;
        update.set_description(String::from_utf8_lossy(&decoded).into_owned());
        Ok(Outcome::Success)
    }

    async fn pipeline(&self, http: &HttpClient) -> Result<Reading> {
        let (outcome, update) = self.resource(http).await?;
        let Some(mut update) = update else {
            return Ok((outcome, None));
        };

        let outcome = self.latest_version(http, &mut update).await?;
        if outcome != Outcome::Success {
            return Ok((outcome, None));
        }

        let outcome = self.latest_update(http, &mut update).await?;
        if outcome != Outcome::Success {
            return Ok((outcome, None));
        }

        Ok((Outcome::Success, Some(update)))
    }
}

#[async_trait]
impl Channel for SpigotChannel {
    async fn read(&self, http: &HttpClient) -> Reading {
        match self.pipeline(http).await {
            Ok(reading) => reading,
            Err(err) => {
                tracing::debug!(resource_id = %self.resource_id, %err, "spigot channel read failed");
                error()
            }
        }
    }
}
