//! Application Default Credentials and OAuth2 access tokens.
//!
//! Credentials are located the way Google's client libraries do it:
//!
//! 1. `GOOGLE_APPLICATION_CREDENTIALS` pointing at a JSON credentials file
//! 2. The gcloud well-known file (`gcloud auth application-default login`)
//! 3. The GCE metadata server
//!
//! Credentials files may hold user credentials (exchanged with their refresh
//! token) or a service account key (exchanged with an RS256-signed JWT
//! assertion). Tokens are cached and refreshed shortly before they expire.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::EngineError;

/// Environment variable naming a credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable overriding the gcloud configuration directory.
pub const CLOUDSDK_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";

/// Environment variable overriding the metadata server host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

/// Google's OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for service account tokens.
pub const SERVICE_ACCOUNT_SCOPES: &str =
    "https://www.googleapis.com/auth/earthengine https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion. Google rejects anything over an hour.
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Upper bound on a metadata server token request. Off Google Cloud the
/// host may resolve but never answer.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// =============================================================================
// Credential Sources
// =============================================================================

/// Where access tokens come from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A bearer token issued elsewhere. Used as-is, never refreshed.
    AccessToken(String),

    /// User credentials from `gcloud auth application-default login`.
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },

    /// A service account key. `private_key` is the PEM from the key file.
    ServiceAccount {
        client_email: String,
        private_key: String,
        private_key_id: Option<String>,
        token_uri: String,
    },

    /// The metadata server of the GCE/GKE/Cloud Run host we are running on.
    MetadataServer { base_url: String },
}

/// On-disk credentials file, discriminated by its `type` field.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default)]
        token_uri: Option<String>,
    },
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl CredentialSource {
    /// Locate Application Default Credentials, reading variables through
    /// `lookup` (normally `std::env::var_os`).
    ///
    /// Falls back to the metadata server when no credentials file exists; on a
    /// machine without one, the failure shows up when the first token is
    /// requested.
    pub fn discover_with<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(path) = lookup(CREDENTIALS_ENV) {
            let path = PathBuf::from(path);
            debug!(path = %path.display(), "Using credentials named by {}", CREDENTIALS_ENV);
            return Self::from_file(&path);
        }

        if let Some(path) = well_known_file(&lookup) {
            if path.is_file() {
                debug!(path = %path.display(), "Using gcloud application default credentials");
                return Self::from_file(&path);
            }
        }

        debug!("No credentials file found, using the metadata server");
        Ok(Self::metadata_server_with(&lookup))
    }

    /// Load credentials from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Credentials(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse the contents of a credentials file.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| EngineError::Credentials(format!("malformed credentials file: {}", e)))?;

        match file {
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => Ok(CredentialSource::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            }),
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                // Fail on a broken key now rather than at the first exchange
                EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
                    EngineError::Credentials(format!(
                        "invalid private key for service account {}: {}",
                        client_email, e
                    ))
                })?;

                Ok(CredentialSource::ServiceAccount {
                    client_email,
                    private_key,
                    private_key_id,
                    token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
                })
            }
            CredentialsFile::Unsupported => Err(EngineError::Credentials(
                "unsupported credentials type".to_string(),
            )),
        }
    }

    /// The metadata server source, honouring `GCE_METADATA_HOST`.
    fn metadata_server_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let host = lookup(METADATA_HOST_ENV)
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        CredentialSource::MetadataServer {
            base_url: format!("http://{}", host),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::AccessToken(_) => "access_token",
            CredentialSource::AuthorizedUser { .. } => "authorized_user",
            CredentialSource::ServiceAccount { .. } => "service_account",
            CredentialSource::MetadataServer { .. } => "metadata_server",
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::AccessToken(_) => f.write_str("AccessToken(..)"),
            CredentialSource::AuthorizedUser {
                client_id,
                token_uri,
                ..
            } => f
                .debug_struct("AuthorizedUser")
                .field("client_id", client_id)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
            CredentialSource::ServiceAccount {
                client_email,
                token_uri,
                ..
            } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
            CredentialSource::MetadataServer { base_url } => f
                .debug_struct("MetadataServer")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn well_known_file<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    let config_dir = match lookup(CLOUDSDK_CONFIG_ENV) {
        Some(dir) => Some(PathBuf::from(dir)),
        None if cfg!(windows) => dirs::config_dir().map(|d| d.join("gcloud")),
        None => dirs::home_dir().map(|h| h.join(".config").join("gcloud")),
    };
    config_dir.map(|d| d.join(WELL_KNOWN_FILE))
}

// =============================================================================
// Service Account Assertions
// =============================================================================

/// Claims of the JWT exchanged for a service account token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

/// Sign a JWT-bearer assertion for a service account.
pub fn sign_assertion(
    client_email: &str,
    private_key: &str,
    private_key_id: Option<&str>,
    token_uri: &str,
    now: SystemTime,
) -> Result<String, EngineError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|e| EngineError::Credentials(format!("system clock before epoch: {}", e)))?
        .as_secs();

    let claims = AssertionClaims {
        iss: client_email.to_string(),
        scope: SERVICE_ACCOUNT_SCOPES.to_string(),
        aud: token_uri.to_string(),
        iat,
        exp: iat + ASSERTION_LIFETIME.as_secs(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = private_key_id.map(str::to_string);

    let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| EngineError::Credentials(format!("invalid private key: {}", e)))?;

    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| EngineError::Credentials(format!("cannot sign assertion: {}", e)))
}

// =============================================================================
// Token Provider
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now + EXPIRY_MARGIN < expires_at,
        }
    }
}

/// Expiry instant for a token issued at `now`. A lifetime too long to
/// represent is treated as no expiry.
fn expiry_after(now: Instant, expires_in: Option<u64>) -> Option<Instant> {
    expires_in.and_then(|secs| now.checked_add(Duration::from_secs(secs)))
}

/// Hands out access tokens for a credential source, refreshing as needed.
///
/// The cache lock is held across a refresh so concurrent callers wait for one
/// token exchange instead of each starting their own.
pub struct TokenProvider {
    source: CredentialSource,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(source: CredentialSource) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one if the cached token
    /// is missing or about to expire.
    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String, EngineError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
            debug!(source = self.source.kind(), "Access token expired, refreshing");
        }

        let token = self.fetch(http).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<CachedToken, EngineError> {
        let response = match &self.source {
            CredentialSource::AccessToken(token) => {
                return Ok(CachedToken {
                    value: token.clone(),
                    expires_at: None,
                });
            }
            CredentialSource::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => http
                .post(token_uri)
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ])
                .send()
                .await,
            CredentialSource::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                let assertion = sign_assertion(
                    client_email,
                    private_key,
                    private_key_id.as_deref(),
                    token_uri,
                    SystemTime::now(),
                )?;
                http.post(token_uri)
                    .form(&[
                        ("grant_type", JWT_BEARER_GRANT),
                        ("assertion", assertion.as_str()),
                    ])
                    .send()
                    .await
            }
            CredentialSource::MetadataServer { base_url } => {
                http.get(format!(
                    "{}{}",
                    base_url.trim_end_matches('/'),
                    METADATA_TOKEN_PATH
                ))
                .header("Metadata-Flavor", "Google")
                .timeout(METADATA_TIMEOUT)
                .send()
                .await
            }
        };

        let response = response.map_err(|e| {
            EngineError::Credentials(format!(
                "token request ({}) failed: {}",
                self.source.kind(),
                e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Credentials(format!(
                "token endpoint ({}) returned {}: {}",
                self.source.kind(),
                status.as_u16(),
                body.trim()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            EngineError::Credentials(format!("malformed token response: {}", e))
        })?;

        debug!(
            source = self.source.kind(),
            expires_in = ?token.expires_in,
            "Obtained access token"
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: expiry_after(Instant::now(), token.expires_in),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
