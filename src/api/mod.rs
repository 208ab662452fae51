//! Typed client for the LabTrack REST backend.
//!
//! The backend owns all persistence and the real authorization checks;
//! this client only consumes its endpoints. Non-2xx responses are mapped
//! to [`Error::Api`] carrying the backend's own `{ "error": ... }`
//! message verbatim so workflows can surface it to the operator
//! unchanged. Nothing here retries automatically.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Error;
use crate::models::{
    LoginRequest, LoginResponse, NewProductionLine, NewSample, NewSampleType, NewUser,
    ProductionLine, Sample, SampleResult, SampleType, User, UserUpdate,
};
use crate::Result;

/// Error envelope the backend uses for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Debug, Deserialize)]
struct SamplesEnvelope {
    #[serde(default)]
    samples: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct ProductionLinesEnvelope {
    #[serde(default)]
    production_lines: Vec<ProductionLine>,
}

#[derive(Debug, Deserialize)]
struct SampleTypesEnvelope {
    #[serde(default)]
    sample_types: Vec<SampleType>,
}

pub struct ApiClient {
    base: Url,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Validation(format!("invalid API base URL {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Validation(format!(
                "invalid API base URL {base_url:?}: not an http(s) URL"
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base,
            token: None,
            client,
        })
    }

    /// Attach the bearer token sent with every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a URL from path segments. Segments are percent-encoded, so
    /// operator-entered sample codes are safe to pass through.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and return the successful response body, with the
    /// backend's error envelope already mapped on failure.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<bytes::Bytes> {
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(status, &bytes),
            });
        }

        Ok(bytes)
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        let bytes = self.send(method, url, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Variant for mutations whose response body carries nothing this
    /// client needs (some endpoints answer with a message, some with an
    /// empty body).
    async fn request_unit<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<()> {
        self.send(method, url, body).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.request::<(), T>(Method::GET, url, None).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        self.request(Method::POST, url, Some(body)).await
    }

    async fn post_unit<B: Serialize>(&self, url: Url, body: &B) -> Result<()> {
        self.request_unit(Method::POST, url, Some(body)).await
    }

    async fn put_unit<B: Serialize>(&self, url: Url, body: &B) -> Result<()> {
        self.request_unit(Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, url: Url) -> Result<()> {
        self.request_unit::<()>(Method::DELETE, url, None).await
    }

    // -------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------

    /// `POST /user/loginuser`. Invalid credentials come back as
    /// [`Error::Auth`] so they can be shown inline rather than as a
    /// generic server error.
    pub async fn login(&self, user_id: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            user_id: user_id.to_string(),
            password: password.to_string(),
        };
        let url = self.endpoint(&["user", "loginuser"]);
        match self.post(url, &request).await {
            Err(Error::Api {
                status: 400 | 401,
                message,
            }) => Err(Error::Auth(message)),
            other => other,
        }
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub async fn users(&self) -> Result<Vec<User>> {
        let envelope: UsersEnvelope = self.get(self.endpoint(&["user"])).await?;
        Ok(envelope.users)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<()> {
        self.post_unit(self.endpoint(&["user"]), user).await
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<()> {
        let url = self.endpoint(&["user", "updateuser", user_id]);
        self.put_unit(url, update).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.delete(self.endpoint(&["user", user_id])).await
    }

    // -------------------------------------------------------------------
    // Samples
    // -------------------------------------------------------------------

    pub async fn samples(&self) -> Result<Vec<Sample>> {
        let envelope: SamplesEnvelope = self.get(self.endpoint(&["sample", "samples"])).await?;
        Ok(envelope.samples)
    }

    pub async fn sample(&self, sample_id: i64) -> Result<Sample> {
        let url = self.endpoint(&["sample", "samples", &sample_id.to_string()]);
        self.get(url).await
    }

    pub async fn sample_by_code(&self, code: &str) -> Result<Sample> {
        let url = self.endpoint(&["sample", "samples-by-code", code]);
        self.get(url).await
    }

    pub async fn create_sample(&self, sample: &NewSample) -> Result<()> {
        let url = self.endpoint(&["sample", "samples"]);
        self.post_unit(url, sample).await
    }

    /// `PUT /sample/samples/:id` with full-replace semantics: fields the
    /// payload carries as null are stored as null.
    pub async fn update_sample(&self, sample_id: i64, result: &SampleResult) -> Result<()> {
        let url = self.endpoint(&["sample", "samples", &sample_id.to_string()]);
        self.put_unit(url, result).await
    }

    pub async fn delete_sample(&self, sample_id: i64) -> Result<()> {
        let url = self.endpoint(&["sample", "samples", &sample_id.to_string()]);
        self.delete(url).await
    }

    // -------------------------------------------------------------------
    // Reference data
    // -------------------------------------------------------------------

    pub async fn production_lines(&self) -> Result<Vec<ProductionLine>> {
        let url = self.endpoint(&["production", "production-lines"]);
        let envelope: ProductionLinesEnvelope = self.get(url).await?;
        Ok(envelope.production_lines)
    }

    pub async fn create_production_line(&self, line: &NewProductionLine) -> Result<()> {
        let url = self.endpoint(&["production", "production-lines"]);
        self.post_unit(url, line).await
    }

    /// The backend refuses to delete a line referenced by existing
    /// samples; that refusal surfaces as a normal [`Error::Api`].
    pub async fn delete_production_line(&self, production_id: i64) -> Result<()> {
        let url = self.endpoint(&["production", "production-lines", &production_id.to_string()]);
        self.delete(url).await
    }

    pub async fn sample_types(&self) -> Result<Vec<SampleType>> {
        let url = self.endpoint(&["sampletype", "sample-types"]);
        let envelope: SampleTypesEnvelope = self.get(url).await?;
        Ok(envelope.sample_types)
    }

    pub async fn create_sample_type(&self, sample_type: &NewSampleType) -> Result<()> {
        let url = self.endpoint(&["sampletype", "sample-types"]);
        self.post_unit(url, sample_type).await
    }

    pub async fn delete_sample_type(&self, sample_type_id: i64) -> Result<()> {
        let url = self.endpoint(&["sampletype", "sample-types", &sample_type_id.to_string()]);
        self.delete(url).await
    }

    // -------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------

    /// `GET /report/reportsdate?user_id&start[&end]`.
    pub async fn report(&self, user_id: &str, start: &str, end: Option<&str>) -> Result<Vec<Sample>> {
        let mut url = self.endpoint(&["report", "reportsdate"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("user_id", user_id);
            query.append_pair("start", start);
            if let Some(end) = end {
                query.append_pair("end", end);
            }
        }
        let envelope: SamplesEnvelope = self.get(url).await?;
        Ok(envelope.samples)
    }
}

/// Pull the backend's own message out of its `{ "error": ... }` envelope,
/// falling back to the raw body or the status line.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.error;
    }
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        status.to_string()
    } else {
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = client().endpoint(&["sample", "samples", "12"]);
        assert_eq!(url.as_str(), "http://localhost:3000/sample/samples/12");
    }

    #[test]
    fn test_endpoint_encodes_sample_codes() {
        let url = client().endpoint(&["sample", "samples-by-code", "SAMP 2025/001"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/sample/samples-by-code/SAMP%202025%2F001"
        );
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = br#"{"error":"Sample not found"}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Sample not found"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b""),
            "502 Bad Gateway"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, b"boom"),
            "boom"
        );
    }
}
