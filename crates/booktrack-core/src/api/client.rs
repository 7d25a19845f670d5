//! API client for the book tracker REST service.
//!
//! Every request reads the current token from the `SessionStore` and sends
//! it as a bearer credential. Every failure comes back as an `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::{
    AuthToken, Book, BookFields, BookFilters, LoginRequest, RegisterRequest, Registration,
    UserProfile,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production deployment of the book tracker service
pub const DEFAULT_BASE_URL: &str = "https://backendbooktrack-production.up.railway.app/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Successful responses wrap their payload in `data`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// API client for the book tracker service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client for the production service
    pub fn new(session: Arc<SessionStore>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, session)
    }

    /// Create a client for another deployment of the service
    pub fn with_base_url(base_url: &str, session: Arc<SessionStore>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot hold a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ===== Auth =====

    /// Exchange credentials for a token. Storing the token is the caller's job.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let body = LoginRequest { username, password };
        let envelope: Envelope<AuthToken> = self
            .send_json(self.request(Method::POST, &["auth", "login"]).json(&body))
            .await?;
        Ok(envelope.data)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Registration, ApiError> {
        let body = RegisterRequest {
            username,
            password,
            email,
        };
        self.send_json(self.request(Method::POST, &["auth", "register"]).json(&body))
            .await
    }

    // ===== Profile =====

    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let envelope: Envelope<UserProfile> =
            self.send_json(self.request(Method::GET, &["profile"])).await?;
        Ok(envelope.data)
    }

    // ===== Books =====

    /// Fetch every book, optionally narrowed by server-side filters.
    pub async fn list_books(&self, filters: Option<&BookFilters>) -> Result<Vec<Book>, ApiError> {
        let mut request = self.request(Method::GET, &["books"]);
        if let Some(filters) = filters.filter(|f| !f.is_empty()) {
            request = request.query(filters);
        }
        let envelope: Envelope<Vec<Book>> = self.send_json(request).await?;
        debug!(count = envelope.data.len(), "Fetched books");
        Ok(envelope.data)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, ApiError> {
        let envelope: Envelope<Book> = self
            .send_json(self.request(Method::GET, &["books", id]))
            .await?;
        Ok(envelope.data)
    }

    /// Create a book. Empty fields are rejected before anything is sent.
    pub async fn create_book(&self, fields: &BookFields) -> Result<Book, ApiError> {
        fields.validate()?;
        self.save_book(Method::POST, &["books"], fields)
            .await
    }

    /// Replace a book's fields. Empty fields are rejected before anything is sent.
    pub async fn update_book(&self, id: &str, fields: &BookFields) -> Result<Book, ApiError> {
        fields.validate()?;
        self.save_book(Method::PUT, &["books", id], fields)
            .await
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &["books", id]))
            .await?;
        debug!(id = id, "Deleted book");
        Ok(())
    }

    async fn save_book(
        &self,
        method: Method,
        segments: &[&str],
        fields: &BookFields,
    ) -> Result<Book, ApiError> {
        let envelope: Envelope<Book> = self
            .send_json(self.request(method, segments).json(fields))
            .await?;
        Ok(envelope.data)
    }

    // ===== Request pipeline =====

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.load() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored auth token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Append `segments` to the base URL. Each one is percent-encoded, so an
    /// id can never escape its path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(method = %method, url = %url, "Sending request");
        self.client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .headers(self.auth_headers())
    }

    /// Send the request and turn anything but a 2xx response into an error.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed without a response");
            ApiError::network()
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        debug!(status = status.as_u16(), message = %err.message, "Request rejected");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            ApiError::network()
        })?;
        decode(&text)
    }
}

/// Decode a 2xx body. A body that does not match the expected shape counts
/// as a failure even though the status was fine.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "Response did not match the expected shape");
        ApiError::unexpected_response(e)
    })
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn book_json(id: &str, title: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "title": title,
            "author": "Author",
            "genre": "Genre",
            "description": "Description"
        })
    }

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::with_base_url(&server.uri(), Arc::new(SessionStore::in_memory()))
            .expect("client creation")
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::with_base_url(
            "http://localhost:3000/api/",
            Arc::new(SessionStore::in_memory()),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn unparseable_base_url_is_rejected() {
        let result = ApiClient::with_base_url("not a url", Arc::new(SessionStore::in_memory()));
        assert!(result.is_err());
    }

    #[test]
    fn default_client_targets_production() {
        let client = ApiClient::new(Arc::new(SessionStore::in_memory())).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn login_posts_credentials_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "username": "reader", "password": "secret" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "tok-1" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = client.login("reader", "secret").await.unwrap();
        assert_eq!(auth.token, "tok-1");
        // Saving the token is left to the caller.
        assert_eq!(client.session().load(), None);
    }

    #[tokio::test]
    async fn login_surfaces_structured_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "Invalid credentials",
                "errors": { "password": "Password is incorrect" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login("reader", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.field_error("password"), Some("Password is incorrect"));
    }

    #[tokio::test]
    async fn login_without_a_server_is_a_network_error() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ApiClient::with_base_url(
            &format!("http://127.0.0.1:{}", port),
            Arc::new(SessionStore::in_memory()),
        )
        .unwrap();

        let err = client.login("reader", "secret").await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.message, "Network error");
        assert!(err.field_errors.is_empty());
    }

    #[tokio::test]
    async fn register_sends_email_and_returns_untokened_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "username": "reader",
                "password": "secret",
                "email": "reader@example.com"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "User registered",
                "data": { "username": "reader" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registration = client_for(&server)
            .register("reader", "secret", "reader@example.com")
            .await
            .unwrap();
        assert_eq!(registration.message.as_deref(), Some("User registered"));
    }

    #[tokio::test]
    async fn stored_token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .and(header_is("authorization", "Bearer tok-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "u1", "username": "reader", "email": "r@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.session().save("tok-42");
        let profile = client.fetch_profile().await.unwrap();
        assert_eq!(profile.username, "reader");
    }

    #[tokio::test]
    async fn no_authorization_header_without_a_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.list_books(None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn token_changes_are_picked_up_per_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.session().save("first");
        client.list_books(None).await.unwrap();
        client.session().clear();
        client.list_books(None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("authorization").unwrap(),
            "Bearer first"
        );
        assert!(requests[1].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn profile_without_token_reports_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "No token provided" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_profile().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.message, "No token provided");
    }

    #[tokio::test]
    async fn list_books_passes_filters_and_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("genre", "SF"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [book_json("2", "B"), book_json("1", "A")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut filters = BookFilters::new();
        filters.insert("genre".to_string(), "SF".to_string());
        let books = client_for(&server)
            .list_books(Some(&filters))
            .await
            .unwrap();
        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[tokio::test]
    async fn list_without_data_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "books": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).list_books(None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedResponse);
    }

    #[tokio::test]
    async fn get_book_reads_single_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/b7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": book_json("b7", "Emma") })),
            )
            .mount(&server)
            .await;

        let book = client_for(&server).get_book("b7").await.unwrap();
        assert_eq!(book.id, "b7");
        assert_eq!(book.title, "Emma");
    }

    #[tokio::test]
    async fn record_with_id_virtual_still_decodes() {
        let server = MockServer::start().await;
        let mut record = book_json("b7", "Emma");
        record["id"] = json!("b7");
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [record] })))
            .mount(&server)
            .await;

        let books = client_for(&server).list_books(None).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "b7");
    }

    #[tokio::test]
    async fn create_book_with_empty_field_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let fields = BookFields::new("Dune", "Herbert", "", "Spice");
        let err = client_for(&server)
            .create_book(&fields)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.field_error("genre").is_some());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_book_returns_canonical_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/books"))
            .and(body_json(json!({
                "title": "Dune",
                "author": "Herbert",
                "genre": "SF",
                "description": "Spice"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {
                    "_id": "b1",
                    "title": "Dune",
                    "author": "Frank Herbert",
                    "genre": "SF",
                    "description": "Spice"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let book = client_for(&server)
            .create_book(&BookFields::new("Dune", "Herbert", "SF", "Spice"))
            .await
            .unwrap();
        assert_eq!(book.id, "b1");
        assert_eq!(book.author, "Frank Herbert");
    }

    #[tokio::test]
    async fn create_book_without_id_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/books"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "data": { "title": "Dune" } })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_book(&BookFields::new("Dune", "Herbert", "SF", "Spice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedResponse);
    }

    #[tokio::test]
    async fn update_book_puts_to_the_record_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/books/b1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": book_json("b1", "New") })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let book = client_for(&server)
            .update_book("b1", &BookFields::new("New", "A", "G", "D"))
            .await
            .unwrap();
        assert_eq!(book.title, "New");
    }

    #[tokio::test]
    async fn update_book_validates_first() {
        let server = MockServer::start().await;
        let err = client_for(&server)
            .update_book("b1", &BookFields::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field_errors.len(), 4);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_book_accepts_empty_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/books/b1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).delete_book("b1").await.is_ok());
    }

    #[tokio::test]
    async fn book_id_stays_inside_its_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_book("../profile")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/books/..%2Fprofile");
    }

    #[test]
    fn endpoint_keeps_the_base_path() {
        let client = ApiClient::new(Arc::new(SessionStore::in_memory())).unwrap();
        assert_eq!(
            client.endpoint(&["books", "a b"]).as_str(),
            "https://backendbooktrack-production.up.railway.app/api/books/a%20b"
        );
    }

    #[tokio::test]
    async fn delete_missing_book_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/books/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_book("nope")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message, "Resource not found: Not Found");
    }
}
