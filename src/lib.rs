//! Embeddable update checker with pluggable release channels.
//!
//! Given a component's current version and a configured remote channel
//! (GitHub releases, CurseForge servermods, or spigot resources), the
//! updater periodically queries the remote source, decides whether a
//! newer release exists, and optionally downloads it into a target
//! directory. Every check funnels into one [`Outcome`] delivered through
//! the finish hook; failures never escape as errors or panics.
//!
//! ```ignore
//! use std::time::Duration;
//! use updater::{GithubChannel, Outcome, Updater, Version};
//!
//! # async fn demo() -> updater::Result<()> {
//! let current = Version::parse(env!("CARGO_PKG_VERSION")).expect("valid crate version");
//!
//! let mut updater = Updater::builder(current, GithubChannel::new("hexosse/MyPlugin"))
//!     .output("plugins/MyPlugin/updates")
//!     .delay(Duration::from_secs(5))
//!     .period(Duration::from_secs(3600))
//!     .on_finish(|outcome, update| {
//!         if outcome == Outcome::Success {
//!             println!("downloaded {}", update.expect("update on success"));
//!         }
//!     })
//!     .build()?;
//!
//! updater.run().await;
//! # Ok(())
//! # }
//! ```

mod channel;
mod downloader;
mod error;
mod http;
mod update;
mod updater;
mod version;

pub use channel::{BukkitChannel, Channel, GithubChannel, Outcome, Reading, SpigotChannel};
pub use downloader::download;
pub use error::{Result, UpdaterError};
pub use http::HttpClient;
pub use update::Update;
pub use updater::{FinishHook, StartHook, Updater, UpdaterBuilder};
pub use version::{Release, Version};
