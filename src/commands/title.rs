use super::parser::ParsedArgs;

/// Channel name Mattermost sends for direct message conversations
pub const DIRECT_MESSAGE_CHANNEL: &str = "directmessage";

/// Pick the meeting title, falling back to the channel or the requester
pub fn resolve_title(args: &ParsedArgs, channel_name: Option<&str>, user_name: &str) -> String {
    if let Some(title) = args.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return title.to_string();
    }

    match channel_name {
        Some(channel) if !channel.is_empty() && channel != DIRECT_MESSAGE_CHANNEL => {
            format!("{} Meeting", channel)
        }
        _ => format!("Meeting by {}", user_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parser::parse;

    #[test]
    fn test_explicit_title_is_kept() {
        let args = parse(r#"title="Weekly Standup""#);
        assert_eq!(
            resolve_title(&args, Some("eng-standup"), "alice"),
            "Weekly Standup"
        );
    }

    #[test]
    fn test_channel_title() {
        let args = ParsedArgs::default();
        assert_eq!(
            resolve_title(&args, Some("eng-standup"), "alice"),
            "eng-standup Meeting"
        );
    }

    #[test]
    fn test_direct_message_uses_user() {
        let args = ParsedArgs::default();
        assert_eq!(
            resolve_title(&args, Some("directmessage"), "alice"),
            "Meeting by alice"
        );
        assert_eq!(resolve_title(&args, None, "alice"), "Meeting by alice");
        assert_eq!(resolve_title(&args, Some(""), "bob"), "Meeting by bob");
    }

    #[test]
    fn test_blank_title_falls_back() {
        let args = parse(r#"title="""#);
        assert_eq!(
            resolve_title(&args, Some("eng-standup"), "alice"),
            "eng-standup Meeting"
        );

        let args = parse(r#"title="   " duration=15"#);
        assert_eq!(args.duration_minutes, 15);
        assert_eq!(resolve_title(&args, None, "alice"), "Meeting by alice");
    }

    #[test]
    fn test_duration_only_resolves_from_context() {
        let args = parse("duration=45");
        assert_eq!(resolve_title(&args, Some("town-square"), "alice"), "town-square Meeting");
    }
}
