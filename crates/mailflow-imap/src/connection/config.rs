//! Connection configuration types.

use std::time::Duration;

use crate::pipeline::PipelineConfig;

/// Default prefix of generated command tags.
pub const DEFAULT_TAG_PREFIX: char = 'M';

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (port 143). **Not recommended for production.**
    None,
    /// TLS from the start (port 993). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Implicit => 993,
        }
    }
}

/// IMAP connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// TCP connect timeout. No other operation is timed.
    pub connect_timeout: Duration,
    /// Prefix of generated command tags.
    pub tag_prefix: char,
    /// Close the connection when a completion carries an unknown tag.
    pub strict_tags: bool,
    /// Pipelining policy.
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("localhost")
    }
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
    tag_prefix: char,
    strict_tags: bool,
    pipeline: PipelineConfig,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Implicit,
            connect_timeout: Duration::from_secs(30),
            tag_prefix: DEFAULT_TAG_PREFIX,
            strict_tags: false,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the tag prefix.
    #[must_use]
    pub const fn tag_prefix(mut self, prefix: char) -> Self {
        self.tag_prefix = prefix;
        self
    }

    /// Treats completions with unknown tags as fatal.
    #[must_use]
    pub const fn strict_tags(mut self, strict: bool) -> Self {
        self.strict_tags = strict;
        self
    }

    /// Sets the pipelining policy.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            connect_timeout: self.connect_timeout,
            tag_prefix: self.tag_prefix,
            strict_tags: self.strict_tags,
            pipeline: self.pipeline,
        }
    }
}
