//! HTTP client for the Vulnerable Bank API.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Message shown for any transport-level failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error or server unavailable";

/// Transport-level failure. HTTP error statuses are not errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// A failed call, classified for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("Network error or server unavailable")]
    Network,

    #[error("{0}")]
    Server(String),
}

/// Named API routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    RequestPasswordReset,
    ConfirmPasswordReset,
    CheckBalance(String),
    Transfer,
    Transactions(String),
    RequestLoan,
    VirtualCards,
    CreateVirtualCard,
    ToggleCardFreeze(u64),
    CardTransactions(u64),
    BillCategories,
    BillersByCategory(u64),
    CreateBillPayment,
    BillPaymentHistory,
    AdminUsers,
    AdminDeleteAccount(u64),
    AdminPendingLoans,
    AdminApproveLoan(u64),
    AdminCreateAdmin,
}

impl Endpoint {
    /// Path relative to the server base URL.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Login => "/login".into(),
            Endpoint::Register => "/register".into(),
            Endpoint::RequestPasswordReset => "/api/v1/forgot-password".into(),
            Endpoint::ConfirmPasswordReset => "/api/v1/reset-password".into(),
            Endpoint::CheckBalance(account) => {
                format!("/check_balance/{}", urlencoding::encode(account))
            }
            Endpoint::Transfer => "/transfer".into(),
            Endpoint::Transactions(account) => {
                format!("/transactions/{}", urlencoding::encode(account))
            }
            Endpoint::RequestLoan => "/request_loan".into(),
            Endpoint::VirtualCards => "/api/virtual-cards".into(),
            Endpoint::CreateVirtualCard => "/api/virtual-cards/create".into(),
            Endpoint::ToggleCardFreeze(id) => format!("/api/virtual-cards/{}/toggle-freeze", id),
            Endpoint::CardTransactions(id) => format!("/api/virtual-cards/{}/transactions", id),
            Endpoint::BillCategories => "/api/bill-categories".into(),
            Endpoint::BillersByCategory(id) => format!("/api/billers/by-category/{}", id),
            Endpoint::CreateBillPayment => "/api/bill-payments/create".into(),
            Endpoint::BillPaymentHistory => "/api/bill-payments/history".into(),
            Endpoint::AdminUsers => "/admin/users".into(),
            Endpoint::AdminDeleteAccount(id) => format!("/admin/delete_account/{}", id),
            Endpoint::AdminPendingLoans => "/admin/pending_loans".into(),
            Endpoint::AdminApproveLoan(id) => format!("/admin/approve_loan/{}", id),
            Endpoint::AdminCreateAdmin => "/admin/create_admin".into(),
        }
    }
}

/// Normalized response: never an error for 4xx/5xx.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    /// The server's `message` field, if it sent one.
    pub fn message(&self) -> Option<&str> {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    /// Deserialize a named field of the body. `None` if absent, null or
    /// of the wrong shape.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.data.get(name)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(field = name, error = %e, "Unexpected field shape in response");
                None
            }
        }
    }

    /// A string field, also accepting numbers (account numbers come both ways).
    pub fn string_field(&self, name: &str) -> Option<String> {
        match self.data.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// API client for the bank server.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn authorize(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => {
                req.header("Authorization", format!("Bearer {}", token))
            }
            _ => req,
        }
    }

    async fn normalize(resp: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = resp.status();
        let text = resp.text().await?;
        let data = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| {
            serde_json::json!({
                "message": format!("Unexpected response from server (HTTP {})", status.as_u16())
            })
        });
        Ok(ApiResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            data,
        })
    }

    /// Issue a GET request.
    pub async fn get(&self, endpoint: &Endpoint, token: Option<&str>) -> Result<ApiResponse, ApiError> {
        let url = self.url(endpoint);
        debug!(%url, "GET");
        let req = Self::authorize(self.http.get(&url), token);
        let resp = req.send().await?;
        Self::normalize(resp).await
    }

    /// Issue a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &B,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(endpoint);
        debug!(%url, "POST");
        let req = Self::authorize(self.http.post(&url).json(body), token);
        let resp = req.send().await?;
        Self::normalize(resp).await
    }

    /// GET and extract a named field, classifying every failure.
    ///
    /// A successful response without the field counts as a server failure
    /// carrying `fallback`.
    pub async fn fetch_field<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        token: Option<&str>,
        field: &str,
        fallback: &str,
    ) -> Result<T, CallError> {
        let resp = match self.get(endpoint, token).await {
            Ok(resp) => resp,
            Err(e) => {
                error!(path = %endpoint.path(), error = %e, "Fetch failed");
                return Err(CallError::Network);
            }
        };
        if !resp.ok {
            warn!(path = %endpoint.path(), status = resp.status, "Server rejected fetch");
            return Err(CallError::Server(resp.message_or(fallback)));
        }
        resp.field(field)
            .ok_or_else(|| CallError::Server(resp.message_or(fallback)))
    }

    /// POST and require an `ok` response.
    pub async fn submit<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &B,
        token: Option<&str>,
        fallback: &str,
    ) -> Result<ApiResponse, CallError> {
        let resp = match self.post(endpoint, body, token).await {
            Ok(resp) => resp,
            Err(e) => {
                error!(path = %endpoint.path(), error = %e, "Submit failed");
                return Err(CallError::Network);
            }
        };
        if resp.ok {
            Ok(resp)
        } else {
            warn!(path = %endpoint.path(), status = resp.status, "Server rejected submit");
            Err(CallError::Server(resp.message_or(fallback)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockResponse, MockServer};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_endpoint_paths_encode_segments() {
        assert_eq!(Endpoint::CheckBalance("12 34".into()).path(), "/check_balance/12%2034");
        assert_eq!(Endpoint::ToggleCardFreeze(7).path(), "/api/virtual-cards/7/toggle-freeze");
        assert_eq!(Endpoint::AdminApproveLoan(3).path(), "/admin/approve_loan/3");
    }

    #[test]
    fn test_message_fallback() {
        let resp = ApiResponse { ok: false, status: 400, data: json!({"message": ""}) };
        assert_eq!(resp.message_or("Failed"), "Failed");
        let resp = ApiResponse { ok: false, status: 400, data: json!({"message": "Nope"}) };
        assert_eq!(resp.message_or("Failed"), "Nope");
    }

    #[tokio::test]
    async fn test_post_then_get_roundtrip() {
        let body = json!({"status": "success", "balance": 1500.5});
        let server = MockServer::start(vec![
            MockResponse::json("POST", "/transfer", 200, body.clone()),
            MockResponse::json("GET", "/transfer", 200, body.clone()),
        ])
        .await;
        let client = ApiClient::new(server.url());

        let posted = client
            .post(&Endpoint::Transfer, &json!({"amount": 10}), None)
            .await
            .unwrap();
        assert!(posted.ok);

        let fetched = client.get(&Endpoint::Transfer, None).await.unwrap();
        assert!(fetched.ok);
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.data, body);

        let requests = server.requests();
        assert_eq!(requests[0].body_json(), Some(json!({"amount": 10})));
    }

    #[tokio::test]
    async fn test_bearer_header_only_when_token_present() {
        let server = MockServer::start(vec![
            MockResponse::json("GET", "/api/virtual-cards", 200, json!({"cards": []})),
        ])
        .await;
        let client = ApiClient::new(server.url());

        client.get(&Endpoint::VirtualCards, Some("abc")).await.unwrap();
        client.get(&Endpoint::VirtualCards, Some("")).await.unwrap();
        client.get(&Endpoint::VirtualCards, None).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].header("authorization").as_deref(), Some("Bearer abc"));
        assert_eq!(requests[1].header("authorization"), None);
        assert_eq!(requests[2].header("authorization"), None);
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let server = MockServer::start(vec![
            MockResponse::json("POST", "/login", 401, json!({"message": "Invalid credentials"})),
            MockResponse::raw("GET", "/api/bill-categories", 500, "<html>oops</html>"),
        ])
        .await;
        let client = ApiClient::new(server.url());

        let resp = client.post(&Endpoint::Login, &json!({}), None).await.unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.status, 401);
        assert_eq!(resp.message(), Some("Invalid credentials"));

        let resp = client.get(&Endpoint::BillCategories, None).await.unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.message(), Some("Unexpected response from server (HTTP 500)"));
    }

    #[tokio::test]
    async fn test_network_failure_is_an_error() {
        let client = ApiClient::new(crate::test_support::unreachable_url().await);
        let result = client.get(&Endpoint::VirtualCards, None).await;
        assert!(matches!(result, Err(ApiError::Network(_))));

        let result: Result<Vec<Value>, _> = client
            .fetch_field(&Endpoint::VirtualCards, None, "cards", "Failed to fetch cards")
            .await;
        assert_eq!(result, Err(CallError::Network));
    }

    #[tokio::test]
    async fn test_fetch_field_classification() {
        let server = MockServer::start(vec![
            MockResponse::json("GET", "/api/virtual-cards", 200, json!({"status": "ok"})),
            MockResponse::json("GET", "/admin/users", 403, json!({"message": "Admins only"})),
        ])
        .await;
        let client = ApiClient::new(server.url());

        let missing: Result<Vec<Value>, _> = client
            .fetch_field(&Endpoint::VirtualCards, None, "cards", "Failed to fetch cards")
            .await;
        assert_eq!(missing, Err(CallError::Server("Failed to fetch cards".into())));

        let rejected: Result<Vec<Value>, _> = client
            .fetch_field(&Endpoint::AdminUsers, None, "users", "Failed to fetch users")
            .await;
        assert_eq!(rejected, Err(CallError::Server("Admins only".into())));
    }
}
