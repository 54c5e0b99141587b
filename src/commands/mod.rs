use crate::components::{MeetingProvider, MeetingRequest};
use crate::error::BotResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

pub mod parser;
pub mod title;
pub mod util;

pub use parser::{parse, ParsedArgs};
pub use title::resolve_title;

/// Fallback when Mattermost omits `user_name`
pub const UNKNOWN_USER: &str = "Unknown User";

/// Fields of a slash command POST that the bot uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub text: String,
    pub user_name: String,
    pub channel_name: Option<String>,
    pub token: String,
}

impl CommandRequest {
    /// Decode an `application/x-www-form-urlencoded` body
    pub fn from_form(body: &[u8]) -> Self {
        let mut request = CommandRequest {
            text: String::new(),
            user_name: UNKNOWN_USER.to_string(),
            channel_name: None,
            token: String::new(),
        };

        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "text" => request.text = value.into_owned(),
                "user_name" if !value.is_empty() => request.user_name = value.into_owned(),
                "channel_name" if !value.is_empty() => request.channel_name = Some(value.into_owned()),
                "token" => request.token = value.into_owned(),
                _ => {}
            }
        }

        request
    }
}

/// Who gets to see the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

/// Body returned to Mattermost
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Meet(ParsedArgs),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("help") {
            Command::Help
        } else {
            Command::Meet(parse(text))
        }
    }
}

/// Runs an authenticated `/meet` request through parsing, title resolution
/// and the meeting provider.
///
/// `provider` is `None` when the provider failed to initialize at startup;
/// every request except `help` is then answered with a fixed
/// "not available" message.
#[derive(Clone)]
pub struct MeetCommand {
    provider: Option<Arc<dyn MeetingProvider>>,
}

impl MeetCommand {
    pub fn new(provider: Option<Arc<dyn MeetingProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn handle(&self, request: &CommandRequest) -> BotResult<CommandResponse> {
        let args = match Command::parse(&request.text) {
            Command::Help => return Ok(util::help_response()),
            Command::Meet(args) => args,
        };

        let Some(provider) = &self.provider else {
            return Ok(util::unavailable_response());
        };

        let title = resolve_title(&args, request.channel_name.as_deref(), &request.user_name);

        info!(
            "Creating Google Meet: title='{}', duration={}, quick={}",
            title, args.duration_minutes, args.quick
        );

        let result = if args.quick {
            provider.create_instant_meeting(&title).await
        } else {
            let meeting = MeetingRequest::starting_now(&title, args.duration_minutes)?;
            provider.create_meeting(&meeting).await
        };

        match result {
            Ok(url) => {
                info!(
                    "Successfully created Google Meet for user {}: {}",
                    request.user_name, url
                );
                let duration = (!args.quick).then_some(args.duration_minutes);
                Ok(util::created_response(&title, &url, duration, &request.user_name))
            }
            Err(e) => {
                error!(
                    "Failed to create Google Meet for user {} via {}: {}",
                    request.user_name,
                    provider.name(),
                    e
                );
                Ok(util::failed_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_decodes_fields() {
        let request = CommandRequest::from_form(
            b"token=abc&text=title%3D%22Weekly+Standup%22+duration%3D90&user_name=alice&channel_name=eng-standup&team_id=T1",
        );

        assert_eq!(request.token, "abc");
        assert_eq!(request.text, r#"title="Weekly Standup" duration=90"#);
        assert_eq!(request.user_name, "alice");
        assert_eq!(request.channel_name.as_deref(), Some("eng-standup"));
    }

    #[test]
    fn test_from_form_defaults() {
        let request = CommandRequest::from_form(b"token=abc&channel_name=");

        assert_eq!(request.text, "");
        assert_eq!(request.user_name, UNKNOWN_USER);
        assert_eq!(request.channel_name, None);
    }

    #[test]
    fn test_command_parse_help() {
        assert_eq!(Command::parse(" HELP "), Command::Help);
        assert_eq!(Command::parse("help me"), Command::Meet(parse("help me")));
    }

    #[test]
    fn test_response_type_serializes_snake_case() {
        let value = serde_json::to_value(CommandResponse::ephemeral("hi")).unwrap();
        assert_eq!(value["response_type"], "ephemeral");

        let value = serde_json::to_value(util::created_response("t", "u", None, "x")).unwrap();
        assert_eq!(value["response_type"], "in_channel");
    }
}
