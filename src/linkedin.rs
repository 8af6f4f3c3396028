//! LinkedIn publishing client.
//!
//! Posts go to the UGC (`/v2/ugcPosts`) endpoint as plain-text shares with
//! public visibility. Publishing is sent once and never retried: the call is
//! not idempotent, and a duplicated digest is worse than a missed one.

use crate::config::{LinkedInSettings, Secret};
use crate::error::ApiError;
use crate::transport::{Transport, ensure_success};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use url::Url;

const RESTLI_HEADER: &str = "X-Restli-Protocol-Version";
const RESTLI_VERSION: &str = "2.0.0";

/// Something that can publish a finished post.
pub trait Publisher {
    async fn publish(&self, text: &str) -> Result<(), ApiError>;
}

/// Build the UGC share payload for `text` authored by `person_id`.
pub fn share_payload(person_id: &str, text: &str) -> Value {
    json!({
        "author": format!("urn:li:person:{}", person_id),
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
        }
    })
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Me {
    id: Option<String>,
}

/// [`Publisher`] backed by the LinkedIn REST API.
#[derive(Debug)]
pub struct LinkedInClient {
    transport: Transport,
    api_base: Url,
    access_token: Secret,
    person_id: Option<Secret>,
}

impl LinkedInClient {
    /// `person_id` may be `None` for calls that only need the token
    /// ([`LinkedInClient::member_id`]); publishing then fails.
    pub fn new(
        transport: Transport,
        settings: &LinkedInSettings,
        access_token: Secret,
        person_id: Option<Secret>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            transport,
            api_base: Url::parse(&settings.api_base)?,
            access_token,
            person_id,
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose())
    }

    /// Resolve the member id that owns the access token.
    ///
    /// Tries the OpenID `userinfo` endpoint first (`sub`), then the legacy
    /// profile endpoint `me` (`id`).
    #[instrument(level = "info", skip_all)]
    pub async fn member_id(&self) -> Result<String, ApiError> {
        let userinfo = self.get_json::<UserInfo>("v2/userinfo").await;
        match userinfo {
            Ok(UserInfo { sub: Some(sub) }) => return Ok(sub),
            Ok(_) => warn!("userinfo response has no 'sub'; trying profile endpoint"),
            Err(e) => warn!(error = %e, "userinfo lookup failed; trying profile endpoint"),
        }
        self.get_json::<Me>("v2/me")
            .await?
            .id
            .ok_or_else(|| ApiError::Malformed("profile response has no 'id'".to_string()))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.api_base.join(path)?;
        let bearer = self.bearer();
        let response = self
            .transport
            .send_with_retry(|http| {
                http.get(url.clone())
                    .header(AUTHORIZATION, &bearer)
                    .header(RESTLI_HEADER, RESTLI_VERSION)
            })
            .await?;
        let body = ensure_success(response).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

impl Publisher for LinkedInClient {
    /// Success is 200 or 201; anything else is reported with its body.
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    async fn publish(&self, text: &str) -> Result<(), ApiError> {
        let person_id = self
            .person_id
            .as_ref()
            .ok_or_else(|| ApiError::Malformed("no LinkedIn person id configured".to_string()))?;
        let url = self.api_base.join("v2/ugcPosts")?;

        let request = self
            .transport
            .http()
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json")
            .header(RESTLI_HEADER, RESTLI_VERSION)
            .json(&share_payload(person_id.expose(), text));

        let response = self.transport.send_once(request).await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            info!(%status, "Posted to LinkedIn");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}
