use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode, Url};

use crate::error::Result;

/// User agent sent with every request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/535.7 (KHTML, like Gecko) Chrome/16.0.912.75 Safari/535.7";

/// Upper bound on followed 301/302/303 hops; exceeding it is an error.
const MAX_REDIRECTS: usize = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
const READ_TIMEOUT: Duration = Duration::from_millis(2500);

/// Shared HTTP GET primitive used by all channels and the downloader.
///
/// The underlying [`Client`] is built once and then passed around, which
/// also resolves system proxy settings (reqwest reads them from the
/// environment at construction) a single time per process.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build the client with the fixed user agent, connect/read timeouts
    /// and bounded redirect following.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an externally configured client (tests, custom proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Start a GET request; callers attach headers and send it.
    pub(crate) fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    /// Send a plain GET and surface transport failures as errors.
    pub async fn fetch(&self, url: Url) -> Result<Response> {
        Ok(self.get(url).send().await?)
    }
}

/// Whether a response status counts as usable: any 2xx, or 304.
pub(crate) fn status_ok(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}
