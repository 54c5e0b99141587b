//! Argument parsing for the `/meet` slash command.
//!
//! Accepted shapes of the command text:
//!
//! ```text
//! ""  |  "help"  |  "quick"  |  [title="…"] [duration=<int>]  |  <free text>
//! ```
//!
//! Parsing is best-effort and never fails: anything that does not match a
//! known key falls back to defaults or to a free-text title.

use lazy_static::lazy_static;
use regex::Regex;

/// Duration used when the command text does not specify one
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
/// Duration reported for `/meet quick`
pub const QUICK_DURATION_MINUTES: u32 = 30;
pub const QUICK_TITLE: &str = "Quick Meeting";

lazy_static! {
    static ref TITLE_RE: Regex =
        Regex::new(r#"title=(?:"([^"]*)"|'([^']*)')"#).expect("static regex compile");
    static ref DURATION_RE: Regex = Regex::new(r"duration=(\d+)").expect("static regex compile");
}

/// Structured arguments of a meeting request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub title: Option<String>,
    pub duration_minutes: u32,
    pub quick: bool,
}

impl Default for ParsedArgs {
    fn default() -> Self {
        Self {
            title: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            quick: false,
        }
    }
}

/// The shape the command text was recognised as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandText {
    /// Nothing but whitespace
    Empty,
    /// The `quick` shortcut
    Quick,
    /// At least one of `title=` or `duration=` was present
    KeyValue {
        title: Option<String>,
        duration_minutes: Option<u32>,
    },
    /// No recognised keys; the whole text is the title
    FreeText(String),
}

impl CommandText {
    /// Classify raw command text
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return CommandText::Empty;
        }

        // The shortcut wins before any key scanning happens
        if trimmed.eq_ignore_ascii_case("quick") {
            return CommandText::Quick;
        }

        let title = TITLE_RE.captures(trimmed).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        });

        let duration_match = DURATION_RE.captures(trimmed).and_then(|caps| caps.get(1));

        if title.is_none() && duration_match.is_none() {
            return CommandText::FreeText(trimmed.to_string());
        }

        // Digits too large for u32 keep the default
        let duration_minutes = duration_match.and_then(|m| m.as_str().parse::<u32>().ok());

        CommandText::KeyValue {
            title,
            duration_minutes,
        }
    }
}

impl From<CommandText> for ParsedArgs {
    fn from(text: CommandText) -> Self {
        match text {
            CommandText::Empty => ParsedArgs::default(),
            CommandText::Quick => ParsedArgs {
                title: Some(QUICK_TITLE.to_string()),
                duration_minutes: QUICK_DURATION_MINUTES,
                quick: true,
            },
            CommandText::KeyValue {
                title,
                duration_minutes,
            } => ParsedArgs {
                title,
                duration_minutes: duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
                quick: false,
            },
            CommandText::FreeText(title) => ParsedArgs {
                title: Some(title),
                ..ParsedArgs::default()
            },
        }
    }
}

/// Parse slash command text into meeting arguments
pub fn parse(text: &str) -> ParsedArgs {
    CommandText::classify(text).into()
}
