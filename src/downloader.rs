use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_DISPOSITION;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, UpdaterError};
use crate::http::{status_ok, HttpClient};
use crate::update::Update;

/// Download an update's file into `dir`, creating the directory as
/// needed, and return the path of the file.
///
/// The file name is taken from the `Content-Disposition` header when
/// present, otherwise from the last path segment of the URL. If a file
/// with that name already exists the download is skipped and the
/// existing path returned; a stale file is never refreshed.
///
/// The update must carry a download URL; handing one without is a
/// contract violation, not a recoverable condition.
pub async fn download(http: &HttpClient, update: &Update, dir: &Path) -> Result<PathBuf> {
    let url = update
        .download_url()
        .cloned()
        .ok_or(UpdaterError::MissingDownloadUrl)?;

    ensure_dir(dir).await?;

    let mut response = http.fetch(url.clone()).await?;
    let status = response.status();
    if !status_ok(status) {
        return Err(UpdaterError::Status(status));
    }

    let file_name = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(disposition_filename)
        .or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
        })
        .ok_or_else(|| UpdaterError::InvalidUrl(url.to_string()))?;

    let target = dir.join(&file_name);
    if fs::try_exists(&target).await? {
        tracing::debug!(path = %target.display(), "file already downloaded, skipping");
        return Ok(target);
    }

    tracing::debug!(%url, path = %target.display(), "downloading file");
    let mut file = fs::File::create(&target).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    if fs::try_exists(&target).await? {
        Ok(target)
    } else {
        Err(UpdaterError::FileMissing(target))
    }
}

/// Make sure `dir` exists as a directory: a non-directory entry at that
/// path is removed, a missing path is created with its parents.
async fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => {
            fs::remove_file(dir).await?;
            fs::create_dir_all(dir).await?;
            Ok(())
        }
        Err(_) => {
            fs::create_dir_all(dir).await?;
            Ok(())
        }
    }
}

/// Extract the `filename=` value from a `Content-Disposition` header.
fn disposition_filename(value: &str) -> Option<String> {
    let idx = value.find("filename=")?;
    let raw = value[idx + "filename=".len()..].trim();
    let raw = raw.split(';').next().unwrap_or(raw).trim();
    let name = raw.trim_matches('"').trim();
    (!name.is_empty()).then(|| name.to_owned())
}
