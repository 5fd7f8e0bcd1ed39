use std::path::PathBuf;

/// Convenient result alias for updater operations.
pub type Result<T> = std::result::Result<T, UpdaterError>;

/// Errors that can occur while querying a channel or downloading a file.
#[derive(thiserror::Error, Debug)]
pub enum UpdaterError {
    /// Network request failed (transport error, timeout, or the redirect
    /// limit was exceeded).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote answered with a status outside 2xx/304.
    #[error("unexpected http status: {0}")]
    Status(reqwest::StatusCode),
    /// The response body could not be decoded from JSON.
    #[error("response decoding failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// A version string could not be parsed with the tolerant grammar.
    #[error("unparseable version string: {0:?}")]
    InvalidVersion(String),
    /// A base64-encoded field in a response could not be decoded.
    #[error("malformed base64 in response: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A URL taken from a remote response was malformed.
    #[error("invalid url in response: {0}")]
    InvalidUrl(String),
    /// An update without a download URL was handed to the downloader.
    #[error("update has no download url")]
    MissingDownloadUrl,
    /// Failed to perform a filesystem operation.
    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),
    /// The downloaded file is missing after the write completed.
    #[error("downloaded file missing: {0}")]
    FileMissing(PathBuf),
}
