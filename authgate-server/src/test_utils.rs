use crate::config::AppConfig;
use crate::create_app;
use crate::state::tests::in_memory_cache;
use crate::state::AppState;
use authgate_core::oauth::providers::{GitHubProvider, GoogleProvider};
use authgate_core::oauth::Endpoint;
use authgate_core::{Claims, ProviderRegistry, TokenPair};
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for setting up a complete test environment with mocked services.
///
/// The fixture starts a mock OPA server and a mock identity provider, wires
/// the application against them with an in-memory token store, and offers
/// helpers for sending requests through the router.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     let pair = fixture.login(42, "a@x.com").await;
///
///     let response = fixture.get("/me", Some(&pair.access_token)).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Application state, shared with the router
    pub state: AppState,
    /// Mock server for OPA
    pub opa_mock: MockServer,
    /// Mock server standing in for the Google and GitHub endpoints
    pub provider_mock: MockServer,
}

impl TestFixture {
    /// Creates a fixture with policy enforcement pointed at the OPA mock.
    pub async fn new() -> Self {
        Self::build(true).await
    }

    /// Creates a fixture where the gate only checks the session.
    pub async fn without_policy() -> Self {
        Self::build(false).await
    }

    async fn build(policy_enabled: bool) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        // Create mock servers
        let opa_mock = MockServer::start().await;
        let provider_mock = MockServer::start().await;

        let mut config = AppConfig::for_test_with_mocks(&opa_mock);
        config.policy.enabled = policy_enabled;

        let client =
            AppState::create_oauth_client(&config.oauth).expect("Failed to create OAuth client");
        let registry = Self::mock_registry(&provider_mock, &client);
        let state = AppState::with_registry(&config, in_memory_cache(), registry, client)
            .expect("Failed to create test state");
        let app = create_app(state.clone()).await;

        Self {
            app,
            state,
            opa_mock,
            provider_mock,
        }
    }

    fn mock_registry(provider_mock: &MockServer, client: &Client) -> ProviderRegistry {
        let uri = provider_mock.uri();
        let endpoint = Endpoint::new(format!("{uri}/authorize"), format!("{uri}/token"));

        ProviderRegistry::new()
            .with_provider(
                GoogleProvider::new("google-id", "google-secret")
                    .with_endpoint(endpoint.clone())
                    .with_user_info_url(format!("{uri}/userinfo"))
                    .with_http_client(client.clone()),
            )
            .with_provider(
                GitHubProvider::new("github-id", "github-secret")
                    .with_endpoint(endpoint)
                    .with_user_info_url(format!("{uri}/user"))
                    .with_http_client(client.clone()),
            )
    }

    /// Initializes the test logger with customized settings.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Starts a session directly through the session manager.
    pub async fn login(&self, sub: impl Into<Value>, email: &str) -> TokenPair {
        self.state
            .sessions
            .create_session(&Claims::for_subject(sub, email))
            .await
            .expect("Failed to create session")
    }

    /// Creates a request builder with a JSON content type.
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request, with a bearer token when one is given.
    pub async fn get(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        match token {
            Some(token) => self.send_with_token(Method::GET, uri, token).await,
            None => self.send_with_headers(Method::GET, uri, &[]).await,
        }
    }

    /// Sends a POST request with a JSON body and no credentials.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a body-less request carrying `Authorization: Bearer <token>`.
    pub async fn send_with_token(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: &str,
    ) -> TestResponse {
        self.send_with_authorization(method, uri, &format!("Bearer {token}"))
            .await
    }

    /// Sends a body-less request with a raw `Authorization` header value.
    pub async fn send_with_authorization(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        authorization: &str,
    ) -> TestResponse {
        self.send_with_headers(method, uri, &[("Authorization", authorization)])
            .await
    }

    /// Sends a body-less request with custom headers.
    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = self.request_builder(method, uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request through the router and collects the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// Mocks every OPA decision query with the given response.
    pub async fn add_opa_mock(
        &self,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(self.state.config.policy.decision_path.clone()))
            .respond_with(ResponseTemplate::new(status_code.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.opa_mock)
            .await;
    }

    /// Mocks the OPA decision for one exact input document.
    pub async fn add_opa_decision(
        &self,
        request_body: Value,
        response_body: Value,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(self.state.config.policy.decision_path.clone()))
            .and(matchers::body_json(request_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.opa_mock)
            .await;
    }
}

/// Response from a test request that provides convenient access to status, headers and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
