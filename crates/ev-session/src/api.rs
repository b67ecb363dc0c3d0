//! Backend client.
//!
//! [`Transport`] moves JSON between the engine and the backend; [`ApiClient`]
//! layers the envelope contract and typed endpoints on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use ev_protocol::{
    CreateAffiliationTokenRequest, CreateAffiliationTokenResponse, CreateTokenRequest,
    CreateTokenResponse, Endpoint, Reply, StatusRequest, StatusResponse, StatusesRequest,
    StatusesResponse, VoteRequest, VoteResponse, decode_reply,
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::{SessionConfig, parse_base_url};
use crate::error::{ApiError, SessionError, SessionResult, TransportError};
use crate::store::Credential;

/// Raw JSON exchange with the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, endpoint: Endpoint, body: Value) -> Result<Value, TransportError>;
}

/// HTTPS transport: `POST <backend_url>/<endpoint>` with a JSON body.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &SessionConfig) -> SessionResult<Self> {
        let base_url = parse_base_url(&config.backend_url)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SessionError::Config(format!("build backend client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint.path())
            .map_err(|e| TransportError::new(endpoint, format!("endpoint url: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: Endpoint, body: Value) -> Result<Value, TransportError> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::new(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let snippet: String = raw.chars().take(200).collect();
            return Err(TransportError::new(
                endpoint,
                format!("http status {}: {snippet}", status.as_u16()),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::new(endpoint, format!("decode response: {e}")))
    }
}

/// Typed access to the backend endpoints.
///
/// A reply carrying `status: "error"` becomes [`ApiError`]; anything that
/// prevents getting a well-formed reply becomes [`TransportError`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(config: &SessionConfig) -> SessionResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub async fn call<Req, Res>(&self, endpoint: Endpoint, body: &Req) -> SessionResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| TransportError::new(endpoint, format!("encode request: {e}")))?;
        debug!(%endpoint, "calling backend");
        let raw = self.transport.post_json(endpoint, body).await?;
        match decode_reply::<Res>(raw)
            .map_err(|e| TransportError::new(endpoint, format!("unexpected reply shape: {e}")))?
        {
            Reply::Success(payload) => Ok(payload),
            Reply::Error { reason } => {
                debug!(%endpoint, %reason, "backend rejected request");
                Err(ApiError::new(endpoint, reason).into())
            }
        }
    }

    pub async fn create_affiliation_token(&self, atcoder_id: &str) -> SessionResult<String> {
        let request = CreateAffiliationTokenRequest {
            atcoder_id: atcoder_id.to_string(),
        };
        let response: CreateAffiliationTokenResponse = self
            .call(Endpoint::CreateAffiliationToken, &request)
            .await?;
        Ok(response.affiliation_token)
    }

    pub async fn create_token(
        &self,
        atcoder_id: &str,
        affiliation_token: &str,
    ) -> SessionResult<Credential> {
        let request = CreateTokenRequest {
            atcoder_id: atcoder_id.to_string(),
            affiliation_token: affiliation_token.to_string(),
        };
        let response: CreateTokenResponse = self.call(Endpoint::CreateToken, &request).await?;
        Ok(Credential::new(response.token))
    }

    pub async fn vote(&self, request: VoteRequest) -> SessionResult<()> {
        let _: VoteResponse = self.call(Endpoint::Vote, &request).await?;
        Ok(())
    }

    pub async fn status(
        &self,
        editorial: &str,
        token: Option<&Credential>,
    ) -> SessionResult<StatusResponse> {
        let request = StatusRequest {
            editorial: editorial.to_string(),
            token: token.map(|t| t.as_str().to_string()),
        };
        self.call(Endpoint::Status, &request).await
    }

    /// One `statuses` call; the result is checked to align with `editorials`.
    pub async fn statuses(
        &self,
        token: Option<&Credential>,
        editorials: &[String],
    ) -> SessionResult<Vec<StatusResponse>> {
        let request = StatusesRequest {
            token: token.map(|t| t.as_str().to_string()),
            editorials: editorials.to_vec(),
        };
        let response: StatusesResponse = self.call(Endpoint::Statuses, &request).await?;
        if response.results.len() != editorials.len() {
            return Err(TransportError::new(
                Endpoint::Statuses,
                format!(
                    "expected {} results, got {}",
                    editorials.len(),
                    response.results.len()
                ),
            )
            .into());
        }
        Ok(response.results)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use ev_protocol::Vote;
    use serde_json::json;

    fn client() -> (Arc<ScriptedTransport>, ApiClient) {
        let transport = Arc::new(ScriptedTransport::default());
        (transport.clone(), ApiClient::new(transport))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn error_envelope_becomes_api_error() {
        let (transport, api) = client();
        transport.push(json!({ "status": "error", "reason": "invalid token" }));
        let err = api
            .vote(VoteRequest {
                token: "t".into(),
                contest: "abc300".into(),
                editorial: "https://example.com/e".into(),
                vote: Vote::Up,
            })
            .await
            .unwrap_err();
        assert!(err.is_invalid_token());
        assert_eq!(transport.endpoints(), vec![Endpoint::Vote]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn transport_failure_is_distinct_from_rejection() {
        let (transport, api) = client();
        transport.push_err(TransportError::new(Endpoint::CreateAffiliationToken, "refused"));
        let err = api.create_affiliation_token("alice").await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_success_payload_is_transport_error() {
        let (transport, api) = client();
        transport.push(json!({ "status": "success", "tok": "x" }));
        let err = api.create_token("alice", "aff").await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn statuses_sends_token_and_checks_alignment() {
        let (transport, api) = client();
        transport.push(json!({ "status": "success", "results": [{ "score": 1 }] }));
        let token = Credential::new("tok");
        let err = api
            .statuses(Some(&token), &["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].1["token"], "tok");
        assert_eq!(requests[0].1["editorials"], json!(["a", "b"]));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_token_returns_credential() {
        let (transport, api) = client();
        transport.push(json!({ "status": "success", "reason": null, "token": "fresh" }));
        let credential = api.create_token("alice", "aff").await.unwrap();
        assert_eq!(credential.as_str(), "fresh");
    }
}
