//! Remote sources a release can be discovered on.
//!
//! Every channel exposes one capability, [`Channel::read`], which turns
//! heterogeneous remote JSON into a uniform `(Outcome, Option<Update>)`
//! pair. Network failures, bad statuses, malformed bodies and
//! unparseable versions are all caught at the channel boundary and
//! reported as [`Outcome::Error`]; nothing propagates to the caller.

use std::fmt;

use async_trait::async_trait;

use crate::http::HttpClient;
use crate::update::Update;

mod bukkit;
mod github;
mod spigot;

pub use bukkit::BukkitChannel;
pub use github::GithubChannel;
pub use spigot::SpigotChannel;

/// Result code describing either a channel's raw finding or, after the
/// orchestrator applied its decision policy, what the caller should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A well-formed release candidate was found (channel role), or an
    /// update was found and downloaded if so configured (updater role).
    Success,
    /// A new version exists but nothing was downloaded.
    UpdateAvailable,
    /// The current version is already the latest.
    NoUpdate,
    /// The repository answered but holds no releases or assets.
    RepoNoReleases,
    /// A network, decoding or version-parse failure occurred.
    Error,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Success => "SUCCESS",
            Outcome::UpdateAvailable => "UPDATE_AVAILABLE",
            Outcome::NoUpdate => "NO_UPDATE",
            Outcome::RepoNoReleases => "REPO_NO_RELEASES",
            Outcome::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// What a single poll of a channel produced.
pub type Reading = (Outcome, Option<Update>);

/// A configured remote source plus the protocol logic for discovering
/// the latest release on it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Query the remote source once.
    ///
    /// Never fails; every failure mode is folded into the returned
    /// [`Outcome`]. An update is present exactly when the outcome is
    /// [`Outcome::Success`], and it then always carries a version.
    async fn read(&self, http: &HttpClient) -> Reading;
}

/// Uniform failure reading used by the channel implementations.
pub(crate) fn error() -> Reading {
    (Outcome::Error, None)
}
