//! Earth Engine REST API (v1) client.
//!
//! # Endpoints used
//!
//! ```text
//! GET  /v1/projects/{project}:listAssets   - asset roots (connectivity probe)
//! POST /v1/projects/{project}/maps         - create a map for an expression
//! ```
//!
//! Every call carries `Authorization: Bearer <token>` and
//! `x-goog-user-project: <project>` so usage is billed to the configured
//! project. There are no timeouts or retries: a hung upstream hangs the call.

use std::ffi::OsString;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::EngineError;

use super::credentials::{CredentialSource, TokenProvider};
use super::expression::Image;
use super::visualization::{MapDescriptor, VisParams};
use super::{AssetRoot, EarthEngine};

/// Production Earth Engine endpoint.
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

const API_VERSION: &str = "v1";

/// Let Earth Engine pick JPEG or PNG per tile depending on transparency.
const MAP_FILE_FORMAT: &str = "AUTO_JPEG_PNG";

const USER_PROJECT_HEADER: &str = "x-goog-user-project";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Deserialize)]
struct ListAssetsResponse {
    #[serde(default)]
    assets: Vec<AssetRoot>,
}

#[derive(Deserialize)]
struct CreateMapResponse {
    #[serde(default)]
    name: Option<String>,
}

/// Google API error envelope: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

// =============================================================================
// RestEngine
// =============================================================================

struct Session {
    project: String,
    tokens: TokenProvider,
}

/// Reads environment variables during credential discovery.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<OsString> + Send + Sync>;

/// [`EarthEngine`] implementation backed by the REST API.
pub struct RestEngine {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Option<Arc<Session>>>,
    env: EnvLookup,
}

impl RestEngine {
    /// Create a client with no session.
    ///
    /// `base_url` is normally [`DEFAULT_API_URL`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gee-tiles/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
            env: Arc::new(|key: &str| std::env::var_os(key)),
        })
    }

    /// Read credential discovery variables through `lookup` instead of the
    /// process environment.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Start with a session that already exists, e.g. from a pre-issued
    /// access token. The credentials are not checked until first use.
    pub fn with_session(mut self, project: impl Into<String>, source: CredentialSource) -> Self {
        self.session = RwLock::new(Some(Arc::new(Session {
            project: project.into(),
            tokens: TokenProvider::new(source),
        })));
        self
    }

    /// Establish a session from explicit credentials.
    ///
    /// A first access token is fetched immediately so bad credentials fail
    /// here rather than on the first tile request.
    pub async fn initialize_with(
        &self,
        project: &str,
        source: CredentialSource,
    ) -> Result<(), EngineError> {
        let kind = source.kind();
        let tokens = TokenProvider::new(source);
        tokens.access_token(&self.http).await?;

        *self.session.write().await = Some(Arc::new(Session {
            project: project.to_string(),
            tokens,
        }));

        info!(project = project, credentials = kind, "Earth Engine session established");
        Ok(())
    }

    /// Project of the current session, if any.
    pub async fn project(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.project.clone())
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn session(&self) -> Result<Arc<Session>, EngineError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(EngineError::NotInitialized)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    async fn authorized(
        &self,
        session: &Session,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, EngineError> {
        let token = session.tokens.access_token(&self.http).await?;
        Ok(request
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(USER_PROJECT_HEADER, session.project.as_str()))
    }
}

/// Turn a non-success response into [`EngineError::Api`], preferring the
/// message from Google's error envelope over the raw body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    Err(EngineError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl EarthEngine for RestEngine {
    async fn asset_roots(&self) -> Result<Vec<AssetRoot>, EngineError> {
        let session = self.session().await?;
        let url = self.url(&format!("projects/{}:listAssets", session.project));
        debug!(url = %url, "Listing asset roots");

        let request = self.authorized(&session, self.http.get(&url)).await?;
        let response = check_status(request.send().await?).await?;
        let listing: ListAssetsResponse = response.json().await?;

        Ok(listing.assets)
    }

    async fn initialize(&self, project: &str) -> Result<(), EngineError> {
        let source = CredentialSource::discover_with(|key| (self.env)(key))?;
        debug!(credentials = ?source, "Discovered application default credentials");
        self.initialize_with(project, source).await
    }

    async fn get_map_id(
        &self,
        image: &Image,
        vis: &VisParams,
    ) -> Result<MapDescriptor, EngineError> {
        let session = self.session().await?;
        let url = self.url(&format!("projects/{}/maps", session.project));

        let body = json!({
            "expression": image.clone().visualize(vis).to_expression(),
            "fileFormat": MAP_FILE_FORMAT,
        });
        debug!(url = %url, "Requesting map id");

        let request = self
            .authorized(&session, self.http.post(&url).json(&body))
            .await?;
        let response = check_status(request.send().await?).await?;
        let created: CreateMapResponse = response.json().await?;

        // Earth Engine no longer issues map tokens; the map name is the id.
        Ok(MapDescriptor::new(created.name.unwrap_or_default(), ""))
    }
}

// =============================================================================
// Tests
// =============================================================================
