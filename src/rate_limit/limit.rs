use chrono::Duration;

/// A named request budget: at most `max_requests` per `window` per key.
#[derive(Debug, Clone)]
pub struct Limit {
    pub(crate) max_requests: u32,
    pub(crate) window: Duration,
    pub(crate) message: Option<String>,
}

impl Limit {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            message: None,
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::minutes(1))
    }

    #[must_use]
    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::hours(1))
    }

    /// User-facing message returned when the limit denies a request.
    #[must_use]
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn get_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
