use crate::error::{credentials_error, google_api_error, BotResult};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Google's OAuth token endpoint
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Scope needed to create calendar events with conferences
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
/// Scope needed to create Meet spaces
pub const MEET_SPACE_SCOPE: &str = "https://www.googleapis.com/auth/meetings.space.created";

/// Fields a service account key must carry
const REQUIRED_SERVICE_ACCOUNT_FIELDS: [&str; 5] = [
    "type",
    "project_id",
    "private_key_id",
    "private_key",
    "client_email",
];

/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECONDS: i64 = 60;

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    project_id: String,
    private_key_id: String,
    private_key: String,
    client_email: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

/// Service account JSON key as downloaded from the Cloud console.
///
/// The RSA private key is parsed when the file is loaded, so a broken key is
/// reported at startup instead of on the first request.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub client_email: String,
    pub token_uri: String,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse and validate a service account key
    pub fn from_json(json: &str) -> BotResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| credentials_error(&format!("Service account file is not valid JSON: {}", e)))?;

        for field in REQUIRED_SERVICE_ACCOUNT_FIELDS {
            if value.get(field).is_none() {
                return Err(credentials_error(&format!(
                    "Invalid service account file. Missing field: {}",
                    field
                )));
            }
        }

        if value.get("type").and_then(|t| t.as_str()) != Some("service_account") {
            return Err(credentials_error("JSON file is not a service account file"));
        }

        let file: ServiceAccountFile = serde_json::from_value(value)
            .map_err(|e| credentials_error(&format!("Invalid service account file: {}", e)))?;

        let encoding_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(|e| credentials_error(&format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            project_id: file.project_id,
            private_key_id: file.private_key_id,
            client_email: file.client_email,
            token_uri: file.token_uri,
            encoding_key,
        })
    }
}

/// OAuth authorized-user token file
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    /// Last known access token
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

impl AuthorizedUser {
    pub fn from_json(json: &str) -> BotResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| credentials_error(&format!("Invalid OAuth token file: {}", e)))
    }

    /// The stored access token, if it has a known and still usable expiry
    fn cached_token(&self) -> Option<CachedToken> {
        let access_token = self.token.clone()?;
        let expires_at = parse_expiry(self.expiry.as_deref()?)?;
        Some(CachedToken {
            access_token,
            expires_at,
        })
    }
}

/// Accepts RFC 3339 as well as the naive ISO format some tooling writes
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The two mutually exclusive ways the bot can authenticate
#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl Credentials {
    /// Load credentials, preferring the service account key when both exist
    pub fn discover(service_account_file: &Path, oauth_token_file: &Path) -> BotResult<Self> {
        if service_account_file.exists() {
            info!("Using service account credentials from {}", service_account_file.display());
            let json = fs::read_to_string(service_account_file)?;
            return Ok(Credentials::ServiceAccount(ServiceAccountKey::from_json(&json)?));
        }

        if oauth_token_file.exists() {
            info!("Using OAuth credentials from {}", oauth_token_file.display());
            let json = fs::read_to_string(oauth_token_file)?;
            return Ok(Credentials::AuthorizedUser(AuthorizedUser::from_json(&json)?));
        }

        Err(credentials_error(&format!(
            "No credentials found at {} or {}",
            service_account_file.display(),
            oauth_token_file.display()
        )))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::ServiceAccount(_) => "service_account",
            Credentials::AuthorizedUser(_) => "oauth",
        }
    }
}

/// JWT claims for the service account bearer grant
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECONDS) > now
    }
}

/// Hands out access tokens, minting or refreshing them as needed
pub struct TokenManager {
    credentials: Credentials,
    scope: String,
    subject: Option<String>,
    client: Client,
    // Held across the refresh so concurrent requests wait for one token
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(credentials: Credentials, scope: &str, subject: Option<String>) -> Self {
        let seeded = match &credentials {
            Credentials::AuthorizedUser(user) => user.cached_token(),
            Credentials::ServiceAccount(_) => None,
        };

        Self {
            credentials,
            scope: scope.to_string(),
            subject,
            client: Client::new(),
            cache: Mutex::new(seeded),
        }
    }

    /// Get a usable access token
    pub async fn access_token(&self) -> BotResult<String> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Access token missing or expiring, fetching a new one");
        let fresh = match &self.credentials {
            Credentials::ServiceAccount(key) => self.exchange_assertion(key).await?,
            Credentials::AuthorizedUser(user) => self.refresh_token(user).await?,
        };

        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    /// Build the signed JWT a service account trades for an access token
    pub fn build_assertion(
        key: &ServiceAccountKey,
        scope: &str,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> BotResult<String> {
        let claims = AssertionClaims {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            sub: subject.map(str::to_string),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key.private_key_id.clone());

        encode(&header, &claims, &key.encoding_key)
            .map_err(|e| credentials_error(&format!("Failed to sign token assertion: {}", e)))
    }

    async fn exchange_assertion(&self, key: &ServiceAccountKey) -> BotResult<CachedToken> {
        let assertion =
            Self::build_assertion(key, &self.scope, self.subject.as_deref(), Utc::now())?;

        let params = [
            (
                "grant_type",
                "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string(),
            ),
            ("assertion", assertion),
        ];

        self.request_token(&key.token_uri, &params).await
    }

    async fn refresh_token(&self, user: &AuthorizedUser) -> BotResult<CachedToken> {
        let token_uri = user.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URI);

        let params = [
            ("client_id", user.client_id.clone()),
            ("client_secret", user.client_secret.clone()),
            ("refresh_token", user.refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let token = self.request_token(token_uri, &params).await?;
        info!("Refreshed OAuth access token");
        Ok(token)
    }

    async fn request_token(&self, token_uri: &str, params: &[(&str, String)]) -> BotResult<CachedToken> {
        let response = self.client.post(token_uri).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(credentials_error(&format!(
                "Token request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| google_api_error(&format!("Failed to parse token response: {}", e)))?;

        let expires_in = token.expires_in.unwrap_or(3600);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRIVATE_KEY: &str = include_str!("../../../tests/fixtures/test_rsa_key.pem");

    fn service_account_json() -> Value {
        json!({
            "type": "service_account",
            "project_id": "meet-bot",
            "private_key_id": "key-1",
            "private_key": PRIVATE_KEY,
            "client_email": "bot@meet-bot.iam.gserviceaccount.com"
        })
    }

    #[test]
    fn test_service_account_key_parses() {
        let key = ServiceAccountKey::from_json(&service_account_json().to_string()).unwrap();
        assert_eq!(key.client_email, "bot@meet-bot.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_service_account_missing_field() {
        let mut value = service_account_json();
        value.as_object_mut().unwrap().remove("private_key_id");

        let err = ServiceAccountKey::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("private_key_id"));
    }

    #[test]
    fn test_service_account_wrong_type() {
        let mut value = service_account_json();
        value["type"] = json!("authorized_user");

        assert!(ServiceAccountKey::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_service_account_invalid_private_key() {
        let mut value = service_account_json();
        value["private_key"] = json!("not a key");

        let err = ServiceAccountKey::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("Invalid service account private key"));
    }

    #[test]
    fn test_assertion_is_signed_with_loaded_key() {
        let key = ServiceAccountKey::from_json(&service_account_json().to_string()).unwrap();
        let assertion =
            TokenManager::build_assertion(&key, CALENDAR_SCOPE, Some("admin@example.com"), Utc::now())
                .unwrap();
        assert_eq!(assertion.split('.').count(), 3);
    }

    #[test]
    fn test_authorized_user_seeds_cache() {
        let user = AuthorizedUser::from_json(
            &json!({
                "token": "ya29.cached",
                "refresh_token": "1//refresh",
                "client_id": "id",
                "client_secret": "secret",
                "expiry": "2099-01-01T00:00:00.000000Z"
            })
            .to_string(),
        )
        .unwrap();

        let cached = user.cached_token().unwrap();
        assert_eq!(cached.access_token, "ya29.cached");
        assert!(cached.is_fresh(Utc::now()));
    }

    #[test]
    fn test_parse_expiry_formats() {
        assert!(parse_expiry("2024-05-01T10:00:00Z").is_some());
        assert!(parse_expiry("2024-05-01T10:00:00.123456").is_some());
        assert!(parse_expiry("tomorrow").is_none());
    }

    #[test]
    fn test_expiring_token_is_not_fresh() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn test_discover_prefers_service_account() {
        let dir = tempfile::tempdir().unwrap();
        let sa_path = dir.path().join("service-account.json");
        let oauth_path = dir.path().join("token.json");

        fs::write(&sa_path, service_account_json().to_string()).unwrap();
        fs::write(
            &oauth_path,
            json!({"refresh_token": "r", "client_id": "c", "client_secret": "s"}).to_string(),
        )
        .unwrap();

        let credentials = Credentials::discover(&sa_path, &oauth_path).unwrap();
        assert_eq!(credentials.kind(), "service_account");

        fs::remove_file(&sa_path).unwrap();
        let credentials = Credentials::discover(&sa_path, &oauth_path).unwrap();
        assert_eq!(credentials.kind(), "oauth");

        fs::remove_file(&oauth_path).unwrap();
        assert!(Credentials::discover(&sa_path, &oauth_path).is_err());
    }
}
