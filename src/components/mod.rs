use crate::config::{Config, MeetBackend};
use crate::error::{BotResult, Error, MeetingError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

pub mod google_calendar;
pub mod meet_api;

pub use google_calendar::GoogleCalendarMeet;
pub use meet_api::MeetSpaces;

/// Length of the event backing an instant meeting
pub const INSTANT_MEETING_MINUTES: u32 = 5;

/// Outcome of a provider call: the meeting URL or why there is none
pub type MeetingResult = Result<String, MeetingError>;

/// A meeting ready to be sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl MeetingRequest {
    /// Build a request spanning `duration_minutes` from `start_time`
    pub fn new(title: &str, start_time: DateTime<Utc>, duration_minutes: u32) -> BotResult<Self> {
        if title.trim().is_empty() {
            return Err(Error::InvalidRequest("meeting title is empty".to_string()));
        }

        let end_time = start_time
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .ok_or_else(|| Error::InvalidRequest("meeting duration is too long".to_string()))?;

        if end_time <= start_time {
            return Err(Error::InvalidRequest(
                "meeting duration must be at least one minute".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            start_time,
            end_time,
        })
    }

    /// Build a request starting now
    pub fn starting_now(title: &str, duration_minutes: u32) -> BotResult<Self> {
        Self::new(title, Utc::now(), duration_minutes)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Anything that can turn a meeting request into a joinable video link
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    /// Name of the backend, for logs and health output
    fn name(&self) -> &'static str;

    /// Create a meeting for the given time window
    async fn create_meeting(&self, request: &MeetingRequest) -> MeetingResult;

    /// Create a meeting that starts now, for the `quick` shortcut
    async fn create_instant_meeting(&self, title: &str) -> MeetingResult {
        let request = MeetingRequest::starting_now(title, INSTANT_MEETING_MINUTES)?;
        self.create_meeting(&request).await
    }
}

/// Turn a non-success provider response into the matching error kind
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, MeetingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());

    Err(match status.as_u16() {
        401 | 403 => MeetingError::Unauthorized(body),
        404 => MeetingError::NotFound(body),
        code => MeetingError::Api { status: code, body },
    })
}

/// Construct the configured provider, loading its credentials
pub fn build_provider(config: &Config) -> BotResult<Arc<dyn MeetingProvider>> {
    let provider: Arc<dyn MeetingProvider> = match config.backend {
        MeetBackend::Calendar => Arc::new(GoogleCalendarMeet::from_config(config)?),
        MeetBackend::MeetApi => Arc::new(MeetSpaces::from_config(config)?),
    };

    info!("Meeting provider initialized: {}", provider.name());
    Ok(provider)
}
