use std::fmt;

use reqwest::Url;

use crate::version::Version;

/// A release candidate discovered on a channel.
///
/// Channels fill this in incrementally (the spiget pipeline builds it
/// over three calls); once handed to the orchestrator it is treated as
/// immutable. A channel only reports overall success when `version` is
/// present.
#[derive(Debug, Clone)]
pub struct Update {
    title: String,
    version: Option<Version>,
    download_url: Option<Url>,
    description: Option<String>,
}

impl Update {
    pub fn new(title: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            title: title.into(),
            version,
            download_url: None,
            description: None,
        }
    }

    pub fn with_download_url(mut self, url: Url) -> Self {
        self.download_url = Some(url);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn download_url(&self) -> Option<&Url> {
        self.download_url.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn set_version(&mut self, version: Version) {
        self.version = Some(version);
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}-{}", self.title, version),
            None => f.write_str(&self.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_title_and_version() {
        let update = Update::new("MyPlugin", Version::parse("1.4.0"));
        assert_eq!(update.to_string(), "MyPlugin-1.4.0");

        let untitled = Update::new("MyPlugin", None);
        assert_eq!(untitled.to_string(), "MyPlugin");
    }

    #[test]
    fn builder_style_setters_fill_optional_fields() {
        let url = Url::parse("https://example.org/files/plugin.jar").unwrap();
        let update = Update::new("MyPlugin", Version::parse("1.4.0"))
            .with_download_url(url.clone())
            .with_description("changelog");

        assert_eq!(update.download_url(), Some(&url));
        assert_eq!(update.description(), Some("changelog"));
    }
}
