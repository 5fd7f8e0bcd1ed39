use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use crate::channel::{Channel, Outcome};
use crate::downloader;
use crate::error::Result;
use crate::http::HttpClient;
use crate::update::Update;
use crate::version::Version;

/// Called right before a check queries the channel.
pub type StartHook = dyn Fn() + Send + Sync;

/// Called after every check with the decided outcome, including errors.
pub type FinishHook = dyn Fn(Outcome, Option<Update>) + Send + Sync;

const DEFAULT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Configuration for an [`Updater`]; only the current version and the
/// channel are mandatory.
pub struct UpdaterBuilder {
    current: Version,
    channel: Arc<dyn Channel>,
    download: bool,
    output: Option<PathBuf>,
    delay: Duration,
    period: Duration,
    on_start: Option<Arc<StartHook>>,
    on_finish: Option<Arc<FinishHook>>,
    http: Option<HttpClient>,
}

impl UpdaterBuilder {
    pub fn new(current: Version, channel: impl Channel + 'static) -> Self {
        Self {
            current,
            channel: Arc::new(channel),
            download: true,
            output: None,
            delay: DEFAULT_DELAY,
            period: DEFAULT_PERIOD,
            on_start: None,
            on_finish: None,
            http: None,
        }
    }

    /// Enable or disable downloading a found update. Defaults to enabled.
    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    /// Directory the update file is downloaded into. Without it an update
    /// is only reported, never fetched.
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Initial delay before the one-shot check. Zero runs the first check
    /// inline during [`Updater::run`]. Defaults to 5 seconds.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Period between recurring checks; zero disables them. Defaults to
    /// one hour.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Hook invoked at the beginning of every check.
    pub fn on_start(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    /// Hook invoked at the end of every check, whatever its outcome.
    pub fn on_finish(
        mut self,
        hook: impl Fn(Outcome, Option<Update>) + Send + Sync + 'static,
    ) -> Self {
        self.on_finish = Some(Arc::new(hook));
        self
    }

    /// Use an externally configured HTTP client instead of the default.
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Updater> {
        let http = match self.http {
            Some(http) => http,
            None => HttpClient::new()?,
        };
        Ok(Updater {
            shared: Arc::new(Shared {
                current: self.current,
                channel: self.channel,
                download: self.download,
                output: self.output,
                on_start: self.on_start,
                on_finish: self.on_finish,
                http,
                state: Mutex::new((Outcome::NoUpdate, None)),
                run_guard: tokio::sync::Mutex::new(()),
            }),
            delay: self.delay,
            period: self.period,
            tasks: Vec::new(),
        })
    }
}

struct Shared {
    current: Version,
    channel: Arc<dyn Channel>,
    download: bool,
    output: Option<PathBuf>,
    on_start: Option<Arc<StartHook>>,
    on_finish: Option<Arc<FinishHook>>,
    http: HttpClient,
    state: Mutex<(Outcome, Option<Update>)>,
    // Overlapping one-shot and recurring triggers are serialized here so
    // concurrent checks cannot interleave their state writes.
    run_guard: tokio::sync::Mutex<()>,
}

/// Scheduling and decision orchestrator.
///
/// Owns the configuration, polls the channel on a timer, applies the
/// decision policy, optionally downloads the file and reports the final
/// outcome through the finish hook and the last-result accessors.
pub struct Updater {
    shared: Arc<Shared>,
    delay: Duration,
    period: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl Updater {
    pub fn builder(current: Version, channel: impl Channel + 'static) -> UpdaterBuilder {
        UpdaterBuilder::new(current, channel)
    }

    /// Start the configured timers.
    ///
    /// A positive delay schedules a one-shot check; a positive period
    /// independently schedules recurring checks, the first after one full
    /// period. A zero delay instead runs one check inline before
    /// returning.
    pub async fn run(&mut self) {
        if !self.delay.is_zero() {
            let shared = Arc::clone(&self.shared);
            let delay = self.delay;
            self.tasks.push(tokio::spawn(async move {
                sleep(delay).await;
                check(&shared).await;
            }));
        }

        if !self.period.is_zero() {
            let shared = Arc::clone(&self.shared);
            let period = self.period;
            self.tasks.push(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    check(&shared).await;
                }
            }));
        }

        if self.delay.is_zero() {
            check(&self.shared).await;
        }
    }

    /// Abort the scheduled timers; an in-flight check is not interrupted
    /// mid-write thanks to the run guard, but no further checks fire.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Outcome of the most recent check, `NoUpdate` before the first one.
    pub fn last_outcome(&self) -> Outcome {
        self.shared.state.lock().expect("updater state lock").0
    }

    /// Update found by the most recent check, if any.
    pub fn last_update(&self) -> Option<Update> {
        self.shared.state.lock().expect("updater state lock").1.clone()
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One poll cycle: hooks around a channel read plus the decision policy.
async fn check(shared: &Shared) {
    let _serialized = shared.run_guard.lock().await;

    if let Some(hook) = &shared.on_start {
        hook();
    }

    let (mut outcome, update) = shared.channel.read(&shared.http).await;
    if outcome == Outcome::Success {
        outcome = decide(shared, update.as_ref()).await;
    }
    tracing::debug!(%outcome, "update check finished");

    {
        let mut state = shared.state.lock().expect("updater state lock");
        *state = (outcome, update.clone());
    }

    if let Some(hook) = &shared.on_finish {
        hook(outcome, update);
    }
}

/// Decision policy for a successful channel reading.
async fn decide(shared: &Shared, update: Option<&Update>) -> Outcome {
    // A success reading must carry an update with a version; a channel
    // violating that contract is reported as an error.
    let Some(update) = update else {
        return Outcome::Error;
    };
    let Some(version) = update.version() else {
        return Outcome::Error;
    };

    if *version <= shared.current {
        return Outcome::NoUpdate;
    }

    let Some(_url) = update.download_url() else {
        return Outcome::UpdateAvailable;
    };

    match &shared.output {
        Some(output) if shared.download => {
            match downloader::download(&shared.http, update, output).await {
                // Downloaded and not-downloaded successes are deliberately
                // indistinguishable; callers inspect the filesystem.
                Ok(path) => {
                    tracing::debug!(path = %path.display(), "update downloaded");
                    Outcome::Success
                }
                Err(err) => {
                    tracing::warn!(%err, "update found but download failed");
                    Outcome::UpdateAvailable
                }
            }
        }
        _ => Outcome::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Reading;
    use async_trait::async_trait;
    use reqwest::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubChannel {
        outcome: Outcome,
        update: Option<Update>,
    }

    impl StubChannel {
        fn success(update: Update) -> Self {
            Self {
                outcome: Outcome::Success,
                update: Some(update),
            }
        }

        fn failing(outcome: Outcome) -> Self {
            Self {
                outcome,
                update: None,
            }
        }
    }

    #[async_trait]
    impl Channel for StubChannel {
        async fn read(&self, _http: &HttpClient) -> Reading {
            (self.outcome, self.update.clone())
        }
    }

    fn current() -> Version {
        Version::new(1, 0, 0)
    }

    async fn run_once(builder: UpdaterBuilder) -> Updater {
        let mut updater = builder
            .delay(Duration::ZERO)
            .period(Duration::ZERO)
            .build()
            .expect("updater builds");
        updater.run().await;
        updater
    }

    #[tokio::test]
    async fn same_remote_version_means_no_update() {
        let update = Update::new("MyPlugin", Some(Version::new(1, 0, 0)));
        let updater = run_once(Updater::builder(current(), StubChannel::success(update))).await;
        assert_eq!(updater.last_outcome(), Outcome::NoUpdate);
    }

    #[tokio::test]
    async fn newer_version_without_url_is_only_available() {
        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)));
        let updater = run_once(Updater::builder(current(), StubChannel::success(update))).await;
        assert_eq!(updater.last_outcome(), Outcome::UpdateAvailable);
        assert_eq!(
            updater.last_update().and_then(|u| u.version().cloned()),
            Some(Version::new(1, 1, 0))
        );
    }

    #[tokio::test]
    async fn newer_version_with_successful_download_stays_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MyPlugin.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)))
            .with_download_url(Url::parse(&format!("{}/MyPlugin.jar", server.uri())).unwrap());

        let updater = run_once(
            Updater::builder(current(), StubChannel::success(update)).output(dir.path()),
        )
        .await;

        assert_eq!(updater.last_outcome(), Outcome::Success);
        assert!(dir.path().join("MyPlugin.jar").exists());
    }

    #[tokio::test]
    async fn a_failing_download_downgrades_to_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MyPlugin.jar"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)))
            .with_download_url(Url::parse(&format!("{}/MyPlugin.jar", server.uri())).unwrap());

        let updater = run_once(
            Updater::builder(current(), StubChannel::success(update)).output(dir.path()),
        )
        .await;

        assert_eq!(updater.last_outcome(), Outcome::UpdateAvailable);
        assert!(!dir.path().join("MyPlugin.jar").exists());
    }

    #[tokio::test]
    async fn disabling_download_leaves_success_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)))
            .with_download_url(Url::parse("http://127.0.0.1:9/MyPlugin.jar").unwrap());

        let updater = run_once(
            Updater::builder(current(), StubChannel::success(update))
                .output(dir.path())
                .download(false),
        )
        .await;

        assert_eq!(updater.last_outcome(), Outcome::Success);
        assert!(!dir.path().join("MyPlugin.jar").exists());
    }

    #[tokio::test]
    async fn channel_failures_propagate_unchanged() {
        let updater =
            run_once(Updater::builder(current(), StubChannel::failing(Outcome::Error))).await;
        assert_eq!(updater.last_outcome(), Outcome::Error);

        let updater = run_once(Updater::builder(
            current(),
            StubChannel::failing(Outcome::RepoNoReleases),
        ))
        .await;
        assert_eq!(updater.last_outcome(), Outcome::RepoNoReleases);
    }

    #[tokio::test]
    async fn hooks_run_around_every_check() {
        let started = Arc::new(Mutex::new(0u32));
        let finished = Arc::new(Mutex::new(Vec::new()));

        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)));
        let builder = Updater::builder(current(), StubChannel::success(update))
            .on_start({
                let started = Arc::clone(&started);
                move || *started.lock().unwrap() += 1
            })
            .on_finish({
                let finished = Arc::clone(&finished);
                move |outcome, update| {
                    finished
                        .lock()
                        .unwrap()
                        .push((outcome, update.map(|u| u.title().to_owned())));
                }
            });
        let _updater = run_once(builder).await;

        assert_eq!(*started.lock().unwrap(), 1);
        assert_eq!(
            finished.lock().unwrap().as_slice(),
            &[(Outcome::UpdateAvailable, Some("MyPlugin".to_owned()))]
        );
    }

    #[tokio::test]
    async fn finish_hook_fires_even_on_error() {
        let finished = Arc::new(Mutex::new(Vec::new()));

        let builder = Updater::builder(current(), StubChannel::failing(Outcome::Error)).on_finish({
            let finished = Arc::clone(&finished);
            move |outcome, _| finished.lock().unwrap().push(outcome)
        });
        let _updater = run_once(builder).await;

        assert_eq!(finished.lock().unwrap().as_slice(), &[Outcome::Error]);
    }

    #[tokio::test]
    async fn a_success_reading_without_a_version_is_an_error() {
        let update = Update::new("MyPlugin", None);
        let updater = run_once(Updater::builder(current(), StubChannel::success(update))).await;
        assert_eq!(updater.last_outcome(), Outcome::Error);
    }

    #[tokio::test]
    async fn delayed_check_fires_after_the_delay() {
        let update = Update::new("MyPlugin", Some(Version::new(1, 1, 0)));
        let mut updater = Updater::builder(current(), StubChannel::success(update))
            .delay(Duration::from_millis(20))
            .period(Duration::ZERO)
            .build()
            .expect("updater builds");

        updater.run().await;
        assert_eq!(updater.last_outcome(), Outcome::NoUpdate);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(updater.last_outcome(), Outcome::UpdateAvailable);

        updater.stop();
    }

    #[tokio::test]
    async fn recurring_checks_fire_every_period() {
        let started = Arc::new(Mutex::new(0u32));

        let update = Update::new("MyPlugin", Some(Version::new(1, 0, 0)));
        let mut updater = Updater::builder(current(), StubChannel::success(update))
            .delay(Duration::ZERO)
            .period(Duration::from_millis(25))
            .on_start({
                let started = Arc::clone(&started);
                move || *started.lock().unwrap() += 1
            })
            .build()
            .expect("updater builds");

        updater.run().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        updater.stop();

        // One inline check plus at least one periodic tick.
        assert!(*started.lock().unwrap() >= 2);
    }
}
