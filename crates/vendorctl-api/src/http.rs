//! reqwest-backed [`VendorApi`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::traits::VendorApi;
use crate::types::{
    Cluster, ClusterCreation, CreateClusterOpts, CustomerOpts, CustomerRecord, ValidationFeedback,
};

/// Vendor API origin used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.replicated.com/vendor";

/// Message the customer endpoints return instead of a bare 404.
const CUSTOMER_NOT_FOUND: &str = "Customer not found";

const CLUSTER: &str = "cluster";
const CUSTOMER: &str = "customer";

/// HTTP client for the vendor REST API.
#[derive(Debug, Clone)]
pub struct HttpVendorApi {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpVendorApi {
    /// Builds a client against `base_url` with a per-request timeout.
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("vendorctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v3/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(method = %method, url = %url, "vendor API request");
        self.http
            .request(method, url)
            .header("Authorization", &self.api_token)
            .header("Accept", "application/json")
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::transport(format!("request timed out: {e}"))
            } else {
                ApiError::transport(format!("failed to connect to vendor API: {e}"))
            }
        })
    }
}

#[derive(Deserialize)]
struct CreateClusterResponse {
    cluster: Option<Cluster>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct GetClusterResponse {
    cluster: Cluster,
}

#[derive(Deserialize)]
struct KubeconfigResponse {
    kubeconfig: String,
}

#[derive(Deserialize)]
struct CustomerResponse {
    customer: CustomerRecord,
}

#[derive(Deserialize)]
struct ClusterErrorResponse {
    #[serde(alias = "Error")]
    error: ClusterErrorBody,
}

#[derive(Deserialize)]
struct ClusterErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "validationError")]
    validation_error: Option<ValidationErrors>,
}

#[derive(Deserialize)]
struct ValidationErrors {
    #[serde(default)]
    errors: Vec<String>,
}

#[async_trait]
impl VendorApi for HttpVendorApi {
    async fn create_cluster(&self, opts: &CreateClusterOpts) -> Result<ClusterCreation, ApiError> {
        let url = self.url(CLUSTER);
        let resp = self
            .send(self.request(Method::POST, &url).json(opts))
            .await?;

        let status = resp.status();
        let body = read_body(resp).await?;

        if status == StatusCode::BAD_REQUEST {
            if let Some(feedback) = cluster_validation_feedback(&body) {
                return Ok(ClusterCreation {
                    cluster: None,
                    validation: Some(feedback),
                });
            }
        }
        if !status.is_success() {
            return Err(classify_failure(status, body, CLUSTER, ""));
        }

        let parsed: CreateClusterResponse = decode(&body, CLUSTER)?;
        let validation = (!parsed.errors.is_empty()).then(|| ValidationFeedback {
            message: String::new(),
            errors: parsed.errors,
        });
        Ok(ClusterCreation {
            cluster: parsed.cluster,
            validation,
        })
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster, ApiError> {
        let url = self.url(&format!("{CLUSTER}/{id}"));
        let resp = self.send(self.request(Method::GET, &url)).await?;
        let parsed: GetClusterResponse = handle_response(resp, CLUSTER, id).await?;
        Ok(parsed.cluster)
    }

    async fn get_cluster_kubeconfig(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(&format!("{CLUSTER}/{id}/kubeconfig"));
        let resp = self.send(self.request(Method::GET, &url)).await?;
        let parsed: KubeconfigResponse = handle_response(resp, CLUSTER, id).await?;
        STANDARD
            .decode(parsed.kubeconfig.as_bytes())
            .map_err(|e| ApiError::decode(format!("kubeconfig is not valid base64: {e}")))
    }

    async fn remove_cluster(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("{CLUSTER}/{id}"));
        let resp = self.send(self.request(Method::DELETE, &url)).await?;
        expect_success(resp, CLUSTER, id).await
    }

    async fn create_customer(&self, opts: &CustomerOpts) -> Result<CustomerRecord, ApiError> {
        let url = self.url(CUSTOMER);
        let resp = self
            .send(self.request(Method::POST, &url).json(opts))
            .await?;
        let parsed: CustomerResponse = handle_response(resp, CUSTOMER, "").await?;
        Ok(parsed.customer)
    }

    async fn get_customer(&self, app_id: &str, id: &str) -> Result<CustomerRecord, ApiError> {
        let url = self.url(&format!("app/{app_id}/{CUSTOMER}/{id}"));
        let resp = self.send(self.request(Method::GET, &url)).await?;
        let parsed: CustomerResponse = handle_response(resp, CUSTOMER, id).await?;
        Ok(parsed.customer)
    }

    async fn update_customer(
        &self,
        id: &str,
        opts: &CustomerOpts,
    ) -> Result<CustomerRecord, ApiError> {
        let url = self.url(&format!("{CUSTOMER}/{id}"));
        let resp = self
            .send(self.request(Method::PUT, &url).json(opts))
            .await?;
        let parsed: CustomerResponse = handle_response(resp, CUSTOMER, id).await?;
        Ok(parsed.customer)
    }

    async fn archive_customer(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("{CUSTOMER}/{id}/archive"));
        let resp = self.send(self.request(Method::POST, &url)).await?;
        expect_success(resp, CUSTOMER, id).await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

async fn read_body(resp: Response) -> Result<String, ApiError> {
    resp.text()
        .await
        .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))
}

fn decode<T: DeserializeOwned>(body: &str, kind: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::decode(format!("{kind} response: {e}")))
}

async fn handle_response<T: DeserializeOwned>(
    resp: Response,
    kind: &str,
    id: &str,
) -> Result<T, ApiError> {
    let status = resp.status();
    let body = read_body(resp).await?;
    if !status.is_success() {
        return Err(classify_failure(status, body, kind, id));
    }
    decode(&body, kind)
}

async fn expect_success(resp: Response, kind: &str, id: &str) -> Result<(), ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = read_body(resp).await?;
    Err(classify_failure(status, body, kind, id))
}

/// Maps a non-success response onto the gateway error taxonomy.
fn classify_failure(status: StatusCode, body: String, kind: &str, id: &str) -> ApiError {
    let message = error_message(&body);

    if status == StatusCode::NOT_FOUND || message.as_deref() == Some(CUSTOMER_NOT_FOUND) {
        return ApiError::not_found(kind, id);
    }
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        return ApiError::validation(message.unwrap_or(body));
    }
    tracing::warn!(status = status.as_u16(), kind, id, "vendor API call failed");
    ApiError::http(status.as_u16(), body)
}

/// Extracts a human readable message from the common error body shapes:
/// `{"message": ..}`, `{"error": ".."}` and `{"error": {"message": ..}}`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.get("message"),
        value.get("error"),
        value.get("error").and_then(|e| e.get("message")),
        value.get("Error").and_then(|e| e.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
}

fn cluster_validation_feedback(body: &str) -> Option<ValidationFeedback> {
    let parsed: ClusterErrorResponse = serde_json::from_str(body).ok()?;
    let errors = parsed.error.validation_error?.errors;
    Some(ValidationFeedback {
        message: parsed.error.message,
        errors,
    })
}
