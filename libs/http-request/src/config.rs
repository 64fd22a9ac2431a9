use std::time::Duration;

use crate::error::ClientError;

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 32;

/// Configuration for [`crate::HttpClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Overall request timeout. `None` waits until the transport finishes.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
    /// Chunks buffered between the transport task and the event decoder
    pub event_channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Create configuration from environment variables
    ///
    /// Reads (all optional):
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: overall request timeout
    /// - `HTTP_REQUEST_CONNECT_TIMEOUT_SECS`: connect timeout
    /// - `HTTP_REQUEST_USER_AGENT`: `User-Agent` header value
    /// - `HTTP_REQUEST_EVENT_CHANNEL_CAPACITY`: chunk channel bound for event streams
    ///
    /// # Errors
    /// Returns `ClientError::Build` naming the variable when a numeric value
    /// does not parse.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("HTTP_REQUEST_TIMEOUT_SECS")? {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("HTTP_REQUEST_CONNECT_TIMEOUT_SECS")? {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Ok(user_agent) = std::env::var("HTTP_REQUEST_USER_AGENT") {
            config = config.with_user_agent(user_agent);
        }
        if let Some(capacity) = env_parse::<usize>("HTTP_REQUEST_EVENT_CHANNEL_CAPACITY")? {
            config = config.with_event_channel_capacity(capacity);
        }

        Ok(config)
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ClientError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ClientError::Build(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
