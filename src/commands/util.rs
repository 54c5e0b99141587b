use super::{CommandResponse, ResponseType};

/// Static text for `/meet help`
pub const HELP_TEXT: &str = "
🎥 **Google Meet Bot Help**

**Commands:**
• `/meet` - Create a meeting for this channel/conversation
• `/meet quick` - Create a 30-minute quick meeting
• `/meet title=\"Meeting Name\"` - Create a meeting with custom title
• `/meet title=\"Weekly Standup\" duration=90` - Create a 90-minute meeting
• `/meet help` - Show this help message

**Examples:**
• `/meet` - Creates meeting named after current channel
• `/meet title=\"Daily Standup\"` - Creates \"Daily Standup\" meeting (60 min)
• `/meet title=\"Client Call\" duration=30` - Creates 30-minute \"Client Call\"
• `/meet quick` - Creates instant 30-minute meeting

**Notes:**
• All meetings are created as Google Calendar events with Meet links
• Meeting links are shared in the channel where the command was used
• Duration is in minutes (default: 60 minutes for regular, 30 for quick)
• Anyone with the link can join the meeting
";

pub const UNAVAILABLE_TEXT: &str =
    "❌ Google Meet service is not available. Please check the server configuration.";

pub const FAILED_TEXT: &str =
    "❌ Failed to create Google Meet link. Please check the logs or contact your administrator.";

pub fn help_response() -> CommandResponse {
    CommandResponse::ephemeral(HELP_TEXT)
}

pub fn unavailable_response() -> CommandResponse {
    CommandResponse::ephemeral(UNAVAILABLE_TEXT)
}

pub fn failed_response() -> CommandResponse {
    CommandResponse::ephemeral(FAILED_TEXT)
}

/// Reply for errors nobody planned for; the message is shown to the requester
pub fn internal_error_response(message: &str) -> CommandResponse {
    CommandResponse::ephemeral(format!("❌ An error occurred: {}", message))
}

/// Channel-wide announcement of a new meeting
///
/// `duration_minutes` is `None` for quick meetings, which omit the line.
pub fn created_response(
    title: &str,
    url: &str,
    duration_minutes: Option<u32>,
    user_name: &str,
) -> CommandResponse {
    let mut text = String::from("🎥 **Google Meet Created**\n");
    text.push_str(&format!("**Meeting:** {}\n", title));
    text.push_str(&format!("**Link:** {}\n", url));
    if let Some(minutes) = duration_minutes {
        text.push_str(&format!("**Duration:** {} minutes\n", minutes));
    }
    text.push_str(&format!("**Created by:** @{}", user_name));

    CommandResponse {
        response_type: ResponseType::InChannel,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_response_with_duration() {
        let response = created_response(
            "Weekly Standup",
            "https://meet.google.com/abc-defg-hij",
            Some(90),
            "alice",
        );

        assert_eq!(response.response_type, ResponseType::InChannel);
        assert_eq!(
            response.text,
            "🎥 **Google Meet Created**\n\
             **Meeting:** Weekly Standup\n\
             **Link:** https://meet.google.com/abc-defg-hij\n\
             **Duration:** 90 minutes\n\
             **Created by:** @alice"
        );
    }

    #[test]
    fn test_quick_response_omits_duration() {
        let response = created_response("Quick Meeting", "https://meet.google.com/x", None, "bob");
        assert!(!response.text.contains("Duration"));
        assert!(response.text.ends_with("**Created by:** @bob"));
    }

    #[test]
    fn test_error_responses_are_ephemeral() {
        assert_eq!(failed_response().response_type, ResponseType::Ephemeral);
        assert_eq!(unavailable_response().response_type, ResponseType::Ephemeral);
        assert_eq!(help_response().response_type, ResponseType::Ephemeral);
        assert_eq!(
            internal_error_response("boom").text,
            "❌ An error occurred: boom"
        );
    }
}
