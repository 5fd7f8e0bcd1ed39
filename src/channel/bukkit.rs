use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::channel::{error, Channel, Outcome, Reading};
use crate::error::{Result, UpdaterError};
use crate::http::{status_ok, HttpClient};
use crate::update::Update;
use crate::version::Version;

/// Host to contact.
const HOST: &str = "https://api.curseforge.com";

/// Suffix appended to the parsed version when the declared release type
/// is anything but `"release"`.
const PRE_RELEASE_SUFFIX: &str = "-pre-release";

/// One uploaded file of a project, oldest first.
#[derive(Debug, Deserialize)]
struct ProjectFile {
    name: String,
    #[serde(rename = "downloadUrl")]
    download_url: String,
    #[serde(rename = "fileName")]
    file_name: String,
    #[serde(rename = "releaseType")]
    release_type: String,
}

/// Channel reading the newest file of a CurseForge servermods project.
pub struct BukkitChannel {
    project_id: String,
    api_key: Option<String>,
    base: Url,
}

impl BukkitChannel {
    /// Create a channel for a servermods project id.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: None,
            base: Url::parse(HOST).expect("default curseforge api url"),
        }
    }

    /// Attach a static `X-API-Key` to every query.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the channel at an alternate API host.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    fn files_url(&self) -> Result<Url> {
        let mut url = self
            .base
            .join("servermods/files")
            .map_err(|_| UpdaterError::InvalidUrl("servermods/files".to_owned()))?;
        url.query_pairs_mut()
            .append_pair("projectIds", &self.project_id);
        Ok(url)
    }

    async fn latest_file(&self, http: &HttpClient) -> Result<Reading> {
        let mut request = http.get(self.files_url()?);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-API-Key", api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status_ok(status) {
            return Err(UpdaterError::Status(status));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok((Outcome::RepoNoReleases, None));
        }

        let files: Vec<ProjectFile> = serde_json::from_str(&body)?;
        // Oldest first, so the newest file is the last element.
        let Some(file) = files.last() else {
            return Ok((Outcome::RepoNoReleases, None));
        };

        let version = parse_file_version(&file.file_name, &file.release_type)
            .ok_or_else(|| UpdaterError::InvalidVersion(file.file_name.clone()))?;
        let download_url = Url::parse(&file.download_url)
            .map_err(|_| UpdaterError::InvalidUrl(file.download_url.clone()))?;

        let update = Update::new(&file.name, Some(version)).with_download_url(download_url);
        Ok((Outcome::Success, Some(update)))
    }
}

/// Derive a version from an uploaded file name: the extension is dropped
/// and non-release uploads get a pre-release label so they classify as
/// such.
fn parse_file_version(file_name: &str, release_type: &str) -> Option<Version> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => file_name,
    };
    if release_type == "release" {
        Version::parse(stem)
    } else {
        Version::parse(&format!("{stem}{PRE_RELEASE_SUFFIX}"))
    }
}

#[async_trait]
impl Channel for BukkitChannel {
    async fn read(&self, http: &HttpClient) -> Reading {
        match self.latest_file(http).await {
            Ok(reading) => reading,
            Err(err) => {
                tracing::debug!(project_id = %self.project_id, %err, "bukkit channel read failed");
                error()
            }
        }
    }
}
