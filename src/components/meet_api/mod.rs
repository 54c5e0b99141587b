//! Alternate backend that creates a Meet space directly, without a calendar
//! event. Selected with `MEET_BACKEND=meet-api`.

use super::google_calendar::token::{Credentials, TokenManager, MEET_SPACE_SCOPE};
use super::{check_response, MeetingProvider, MeetingRequest, MeetingResult};
use crate::config::Config;
use crate::error::{BotResult, MeetingError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Base URL of the Meet v2 REST API
pub const MEET_API_BASE: &str = "https://meet.googleapis.com/v2";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpaceRequest {
    config: SpaceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpaceConfig {
    access_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceResponse {
    pub name: Option<String>,
    pub meeting_uri: Option<String>,
}

pub struct MeetSpaces {
    token_manager: TokenManager,
    client: Client,
    api_base: String,
}

impl MeetSpaces {
    pub fn new(token_manager: TokenManager) -> Self {
        Self {
            token_manager,
            client: Client::new(),
            api_base: MEET_API_BASE.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> BotResult<Self> {
        let credentials =
            Credentials::discover(&config.service_account_file, &config.oauth_token_file)?;
        debug!("Authenticating with {} credentials", credentials.kind());
        let token_manager =
            TokenManager::new(credentials, MEET_SPACE_SCOPE, config.impersonate_user.clone());
        Ok(Self::new(token_manager))
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl MeetingProvider for MeetSpaces {
    fn name(&self) -> &'static str {
        "meet-api"
    }

    async fn create_meeting(&self, request: &MeetingRequest) -> MeetingResult {
        // Spaces have no schedule; the window only shows up in the logs
        debug!(
            "Creating Meet space '{}' for {} minutes",
            request.title,
            request.duration_minutes()
        );

        let access_token = self.token_manager.access_token().await?;

        let response = self
            .client
            .post(format!("{}/spaces", self.api_base))
            .bearer_auth(access_token)
            .json(&SpaceRequest {
                config: SpaceConfig {
                    access_type: "OPEN",
                },
            })
            .send()
            .await?;

        let space: SpaceResponse = check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| MeetingError::MalformedResponse(e.to_string()))?;

        let meeting_uri = space
            .meeting_uri
            .filter(|uri| !uri.is_empty())
            .ok_or(MeetingError::MissingLink)?;

        info!(
            "Created Meet space {}",
            space.name.as_deref().unwrap_or("<unknown>")
        );
        Ok(meeting_uri)
    }
}
