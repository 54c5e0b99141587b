pub mod models;
pub mod token;

pub use models::{EventRequest, EventResponse};
pub use token::{Credentials, TokenManager};

use super::{check_response, MeetingProvider, MeetingRequest, MeetingResult};
use crate::config::Config;
use crate::error::{BotResult, MeetingError};
use async_trait::async_trait;
use reqwest::Client;
use token::CALENDAR_SCOPE;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Base URL of the Calendar v3 REST API
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Creates Meet links by inserting calendar events with a Meet conference
pub struct GoogleCalendarMeet {
    calendar_id: String,
    token_manager: TokenManager,
    client: Client,
    api_base: String,
}

impl GoogleCalendarMeet {
    pub fn new(token_manager: TokenManager, calendar_id: &str) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            token_manager,
            client: Client::new(),
            api_base: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Load credentials named in the config and build the provider
    pub fn from_config(config: &Config) -> BotResult<Self> {
        let credentials =
            Credentials::discover(&config.service_account_file, &config.oauth_token_file)?;
        debug!("Authenticating with {} credentials", credentials.kind());
        let token_manager =
            TokenManager::new(credentials, CALENDAR_SCOPE, config.impersonate_user.clone());
        Ok(Self::new(token_manager, &config.calendar_id))
    }

    /// Point the provider at a different API root
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> Result<Url, MeetingError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| MeetingError::InvalidRequest(format!("Failed to parse URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| MeetingError::InvalidRequest("API base cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        url.query_pairs_mut().append_pair("conferenceDataVersion", "1");

        Ok(url)
    }
}

#[async_trait]
impl MeetingProvider for GoogleCalendarMeet {
    fn name(&self) -> &'static str {
        "google-calendar"
    }

    async fn create_meeting(&self, request: &MeetingRequest) -> MeetingResult {
        let access_token = self.token_manager.access_token().await?;

        // Fresh id per attempt so retries never collide on one conference
        let request_id = Uuid::new_v4().to_string();
        let payload = EventRequest::new(request, request_id);
        let url = self.events_url()?;

        debug!("Inserting calendar event '{}' into {}", request.title, self.calendar_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;

        let event: EventResponse = check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| MeetingError::MalformedResponse(e.to_string()))?;

        let meeting_url = event.meeting_url().ok_or(MeetingError::MissingLink)?;

        info!(
            "Created calendar event {} with meeting link",
            event.id.as_deref().unwrap_or("<unknown>")
        );
        Ok(meeting_url.to_string())
    }
}
