use crate::config::secret_store::tests::store_config;
use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

pub(crate) const TEST_SECRET: &str = "test-default-secret";
pub(crate) const STORE_SECRET: &str = "test-store-secret";

/// Test fixture running the full router against a mocked secret store.
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::with_secret_store(None).await;
///     fixture.mount_secret_store(200).await;
///
///     let response = fixture.post("/auth/token", &json!({"userId": "u1", "authToken": "p"})).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    pub app: Router,
    pub state: AppState,
    pub settings: Settings,
    /// Stands in for the secrets extension
    pub secret_store_mock: MockServer,
}

impl TestFixture {
    /// Fixture signing with a static default secret and no backing store
    pub async fn new() -> Self {
        let secret_store_mock = MockServer::start().await;
        let settings = Settings::for_test(
            Some(TEST_SECRET),
            store_config(false, &secret_store_mock.uri()),
        );
        Self::with_settings(settings, secret_store_mock).await
    }

    /// Fixture reading the secret from the mock store, with an optional default
    pub async fn with_secret_store(default: Option<&str>) -> Self {
        let secret_store_mock = MockServer::start().await;
        let settings = Settings::for_test(default, store_config(true, &secret_store_mock.uri()));
        Self::with_settings(settings, secret_store_mock).await
    }

    pub async fn with_settings(settings: Settings, secret_store_mock: MockServer) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let state = AppState::new(settings.clone()).expect("Failed to create app state");
        let app = create_app(state.clone()).await;

        Self {
            app,
            state,
            settings,
            secret_store_mock,
        }
    }

    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Serve `STORE_SECRET` (or fail with `status`) from the mock store
    pub async fn mount_secret_store(&self, status: u16) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/secretsmanager/get"))
            .and(matchers::query_param("secretId", "fitness-app/jwt-secret"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "Name": "fitness-app/jwt-secret",
                "SecretString": format!("{{\"JWT_SECRET\":\"{STORE_SECRET}\"}}"),
            })))
            .mount(&self.secret_store_mock)
            .await;
    }

    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.post_with_headers(uri, body, &[]).await
    }

    pub async fn post_with_headers<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        self.post_raw(uri, json_body, headers).await
    }

    /// POST a body that need not be valid JSON
    pub async fn post_raw(
        &self,
        uri: impl AsRef<str>,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = self.request_builder(Method::POST, uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(body.into()).expect("Failed to build request");
        self.send(request).await
    }

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
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

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

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }
}
