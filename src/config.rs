use crate::error::{config_error, env_error, BotResult};
use dotenvy::dotenv;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Default location of the service account key installed by the setup script
pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "/etc/meet-bot/service-account.json";
/// Default location of the OAuth authorized-user token file
pub const DEFAULT_OAUTH_TOKEN_FILE: &str = "/etc/meet-bot/token.json";
pub const DEFAULT_PORT: u16 = 5000;

/// Which remote API creates the meeting link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetBackend {
    /// Calendar event with an auto-created Meet conference
    #[default]
    Calendar,
    /// Meet REST API space, no calendar event
    MeetApi,
}

impl FromStr for MeetBackend {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(MeetBackend::Calendar),
            "meet-api" | "meet_api" | "meet" => Ok(MeetBackend::MeetApi),
            other => Err(config_error(&format!("Unknown MEET_BACKEND: {}", other))),
        }
    }
}

/// Main configuration structure for the bot
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub host: IpAddr,
    /// Port the HTTP server binds to
    pub port: u16,
    /// Shared secret Mattermost sends with every slash command
    pub mattermost_token: Option<String>,
    /// Service account key, preferred when present
    pub service_account_file: PathBuf,
    /// OAuth authorized-user token file
    pub oauth_token_file: PathBuf,
    /// Calendar that receives the meeting events
    pub calendar_id: String,
    /// User a service account acts on behalf of (domain-wide delegation)
    pub impersonate_user: Option<String>,
    pub backend: MeetBackend,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            mattermost_token: None,
            service_account_file: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE),
            oauth_token_file: PathBuf::from(DEFAULT_OAUTH_TOKEN_FILE),
            calendar_id: "primary".to_string(),
            impersonate_user: None,
            backend: MeetBackend::default(),
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `.env` if it exists)
    pub fn load() -> BotResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        // Empty values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = match get("MEET_BOT_HOST") {
            Some(h) => h.parse::<IpAddr>().map_err(|_| env_error("MEET_BOT_HOST"))?,
            None => defaults.host,
        };

        let port = match get("MEET_BOT_PORT") {
            Some(p) => p.parse::<u16>().map_err(|_| env_error("MEET_BOT_PORT"))?,
            None => defaults.port,
        };

        let backend = match get("MEET_BACKEND") {
            Some(b) => b.parse()?,
            None => defaults.backend,
        };

        let debug = get("DEBUG")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Config {
            host,
            port,
            mattermost_token: get("MATTERMOST_TOKEN"),
            service_account_file: get("GOOGLE_SERVICE_ACCOUNT_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.service_account_file),
            oauth_token_file: get("GOOGLE_OAUTH_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.oauth_token_file),
            calendar_id: get("GOOGLE_CALENDAR_ID").unwrap_or(defaults.calendar_id),
            impersonate_user: get("GOOGLE_IMPERSONATE_USER"),
            backend,
            debug,
        })
    }

    /// Socket address for the HTTP listener
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
