//! Hubble HTTP transport client.
//!
//! Blocking reqwest client (no Tokio runtime required). One client talks to
//! one service in one fixed mode: plain, mutual TLS, or basic auth. The mode,
//! TLS material and base URL are fixed at construction; build a new client
//! for different settings.

use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use log::{debug, warn};
use reqwest::blocking::Response;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::context::Context;
use crate::error::{HubbleError, Result};
use crate::tls::{load_tls_config, TlsConfig};

/// Idle connections are dropped after this long in basic-auth mode.
pub const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a cancellable in-flight request checks its token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

const USER_AGENT: &str = concat!("hubble-client/", env!("CARGO_PKG_VERSION"));

// ── Transport seam ──────────────────────────────────────────────────

/// Executes a fully built request. Implemented by the reqwest pool; wrap it
/// to add behaviour (retries, metrics) without touching call sites.
pub trait Transport: Send + Sync {
    fn execute(&self, request: reqwest::blocking::Request) -> reqwest::Result<Response>;
}

impl Transport for reqwest::blocking::Client {
    fn execute(&self, request: reqwest::blocking::Request) -> reqwest::Result<Response> {
        reqwest::blocking::Client::execute(self, request)
    }
}

// ── Modes ───────────────────────────────────────────────────────────

/// HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    fn header_value(&self) -> Result<HeaderValue> {
        let raw = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
            .map_err(|_| HubbleError::Validation("Basic credentials".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection mode, chosen once at construction.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Default pool, no client certificate, no auth header.
    Plain,
    /// Pool presents the given client certificate.
    MutualTls(TlsConfig),
    /// Server certificates are not verified; credentials are added to every
    /// request at send time. `proxy` routes through the environment's proxy.
    BasicAuth { credentials: Credentials, proxy: bool },
}

/// Authentication applied to each outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Basic(Credentials),
}

/// Status, headers and final URL of a response whose body has been consumed.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub status: u16,
    pub headers: HeaderMap,
    pub url: Url,
}

impl ResponseParts {
    fn of(response: &Response) -> Self {
        Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        is_err_response(i32::from(self.status))
    }
}

/// A request built by [`Client::new_request`], carrying its context.
#[derive(Debug)]
pub struct Request {
    inner: reqwest::blocking::Request,
    context: Context,
}

impl Request {
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Encoded JSON body, if any.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.inner.body().and_then(|body| body.as_bytes())
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Hubble API client (blocking). Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    transport: Arc<dyn Transport>,
    auth: Auth,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Plain client with the default pool.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_mode(base_url, Mode::Plain)
    }

    /// Mutual-TLS client. Fails if the certificate pair cannot be loaded.
    pub fn with_certs(
        base_url: &str,
        certificate_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        insecure_skip_verify: bool,
    ) -> Result<Self> {
        let tls = load_tls_config(certificate_path, key_path, insecure_skip_verify)?;
        Self::with_mode(base_url, Mode::MutualTls(tls))
    }

    /// Basic-auth client without a proxy.
    pub fn basic_auth(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_mode(
            base_url,
            Mode::BasicAuth { credentials: Credentials::new(username, password), proxy: false },
        )
    }

    /// Basic-auth client routed through the environment's proxy
    /// (`HTTPS_PROXY`, `HTTP_PROXY`, `NO_PROXY`).
    pub fn basic_auth_with_proxy(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_mode(
            base_url,
            Mode::BasicAuth { credentials: Credentials::new(username, password), proxy: true },
        )
    }

    pub fn with_mode(base_url: &str, mode: Mode) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let (pool, auth) = build_pool(mode)?;
        Ok(Self { base_url, transport: Arc::new(pool), auth })
    }

    /// Client over a caller-supplied transport, e.g. a decorated pool.
    pub fn with_transport(
        base_url: &str,
        auth: Auth,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            transport: Arc::new(transport),
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    // ── Request construction ────────────────────────────────────────

    /// Build a request for `path`, resolved against the base URL.
    ///
    /// A `Some` body is sent as JSON with `Content-Type: application/json`.
    /// `None` sends neither a body nor a content type; spell it
    /// `None::<&()>` when no other body type is in scope.
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| HubbleError::InvalidUrl(path.to_string(), e.to_string()))?;

        let mut inner = reqwest::blocking::Request::new(method, url);
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(HubbleError::Encode)?;
            *inner.body_mut() = Some(bytes.into());
            inner
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(Request { inner, context: ctx.clone() })
    }

    pub fn new_get_request(&self, ctx: &Context, path: &str) -> Result<Request> {
        self.new_request(ctx, Method::GET, path, None::<&()>)
    }

    pub fn new_post_request<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        path: &str,
        body: &B,
    ) -> Result<Request> {
        self.new_request(ctx, Method::POST, path, Some(body))
    }

    // ── Execution ───────────────────────────────────────────────────

    /// Send the request and return the raw response.
    ///
    /// Basic credentials are added here, right before dispatch. Transport
    /// failures come back unchanged; nothing is retried.
    pub fn execute(&self, request: Request) -> Result<Response> {
        let Request { mut inner, context } = request;
        context.check()?;

        if let Some(remaining) = context.remaining() {
            *inner.timeout_mut() = Some(remaining);
        }
        if let Auth::Basic(credentials) = &self.auth {
            inner.headers_mut().insert(AUTHORIZATION, credentials.header_value()?);
        }

        debug!("{} {}", inner.method(), inner.url().path());

        let response = self.dispatch(inner, &context)?;

        // Drop the response (and its connection) if cancelled mid-flight.
        if context.is_cancelled() {
            return Err(HubbleError::Cancelled);
        }
        Ok(response)
    }

    /// Run the request on the transport. With a cancel token the call runs
    /// on a worker thread and the caller returns as soon as the token flips;
    /// the abandoned call is dropped when it completes or times out.
    fn dispatch(&self, request: reqwest::blocking::Request, context: &Context) -> Result<Response> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() && context.has_deadline() {
                HubbleError::DeadlineExceeded
            } else {
                HubbleError::Transport(e)
            }
        };

        if !context.is_cancellable() {
            return self.transport.execute(request).map_err(map_err);
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let transport = Arc::clone(&self.transport);
        thread::Builder::new()
            .name("hubble-request".into())
            .spawn(move || {
                // The receiver is gone if the caller cancelled.
                let _ = tx.send(transport.execute(request));
            })
            .map_err(HubbleError::Io)?;

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result.map_err(map_err),
                Err(RecvTimeoutError::Timeout) => {
                    if context.is_cancelled() {
                        debug!("request cancelled in flight");
                        return Err(HubbleError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HubbleError::Io(std::io::Error::other(
                        "request worker exited without a response",
                    )));
                }
            }
        }
    }

    /// Send the request and decode the body as JSON, whatever the status.
    ///
    /// On a decode failure the error still carries the response status and
    /// headers. The body is fully consumed and released on every path.
    pub fn do_json<T: DeserializeOwned>(&self, request: Request) -> Result<(ResponseParts, T)> {
        let response = self.execute(request)?;
        let parts = ResponseParts::of(&response);
        let bytes = response.bytes()?;

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok((parts, value)),
            Err(source) => Err(HubbleError::Decode { response: parts, source }),
        }
    }

    /// Send the request and return the body as text.
    ///
    /// For an error status the body is still read and returned inside
    /// [`HubbleError::Status`].
    pub fn do_str(&self, request: Request) -> Result<String> {
        let response = self.execute(request)?;
        let status = response.status().as_u16();

        if is_err_response(i32::from(status)) {
            let body = response.text().unwrap_or_else(|e| {
                warn!("unable to read error response body (HTTP {}): {}", status, e);
                String::new()
            });
            return Err(HubbleError::Status { status, body });
        }

        Ok(response.text()?)
    }

    /// GET `path` and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<(ResponseParts, T)> {
        let request = self.new_get_request(ctx, path)?;
        self.do_json(request)
    }

    /// GET `path` and return the body as text.
    pub fn get_str(&self, ctx: &Context, path: &str) -> Result<String> {
        let request = self.new_get_request(ctx, path)?;
        self.do_str(request)
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// True for any status below 200 or above 399. Redirect statuses count as
/// success here.
pub fn is_err_response(code: i32) -> bool {
    !(200..=399).contains(&code)
}

/// GET `url` with a default client; true only for a 200 answer.
pub fn is_url_reachable(url: &str) -> bool {
    match reqwest::blocking::get(url) {
        Ok(response) => response.status().as_u16() == 200,
        Err(e) => {
            debug!("{} is unreachable: {}", url, e);
            false
        }
    }
}

/// Parse an endpoint into a base URL ending in `/`.
///
/// A bare `host[:port]` is given the `https` scheme.
pub(crate) fn parse_base_url(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(HubbleError::empty_property("Endpoint"));
    }

    let mut raw = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };
    if !raw.ends_with('/') {
        raw.push('/');
    }

    Url::parse(&raw).map_err(|e| HubbleError::InvalidUrl(endpoint.to_string(), e.to_string()))
}

fn build_pool(mode: Mode) -> Result<(reqwest::blocking::Client, Auth)> {
    let builder = reqwest::blocking::Client::builder()
        .use_rustls_tls()
        .user_agent(USER_AGENT);

    match mode {
        Mode::Plain => {
            let pool = builder.build()?;
            Ok((pool, Auth::None))
        }
        Mode::MutualTls(tls) => {
            let pool = builder
                .no_proxy()
                .identity(tls.identity()?)
                .danger_accept_invalid_certs(tls.insecure_skip_verify())
                .build()
                .map_err(|e| crate::tls::load_error(tls.certificate_path(), &e.to_string()))?;
            Ok((pool, Auth::None))
        }
        Mode::BasicAuth { credentials, proxy } => {
            let builder = builder
                .danger_accept_invalid_certs(true)
                .pool_idle_timeout(IDLE_CONNECTION_TIMEOUT);
            let builder = if proxy { builder } else { builder.no_proxy() };
            Ok((builder.build()?, Auth::Basic(credentials)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, serde::Deserialize)]
    struct Payload {
        #[serde(rename = "a")]
        a_value: i64,
    }

    // ── URL handling ────────────────────────────────────────────────

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = Client::new("http://hubble.local/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://hubble.local/api/");

        let client = Client::new("http://hubble.local/api/").unwrap();
        assert_eq!(client.base_url().as_str(), "http://hubble.local/api/");
    }

    #[test]
    fn test_bare_host_defaults_to_https() {
        let client = Client::new("api.example.io:8443").unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.io:8443/");
    }

    #[test]
    fn test_empty_endpoint_is_validation_error() {
        let err = Client::new("  ").unwrap_err();
        assert_eq!(err.to_string(), "Endpoint cannot be empty");
    }

    #[test]
    fn test_relative_path_appended_absolute_overrides() {
        let client = Client::new("http://hubble.local/api").unwrap();
        let ctx = Context::background();

        let req = client.new_get_request(&ctx, "v1/users/me").unwrap();
        assert_eq!(req.url().as_str(), "http://hubble.local/api/v1/users/me");

        let req = client.new_get_request(&ctx, "/v1/users/me").unwrap();
        assert_eq!(req.url().as_str(), "http://hubble.local/v1/users/me");

        let req = client.new_get_request(&ctx, "https://other.io/x").unwrap();
        assert_eq!(req.url().as_str(), "https://other.io/x");
    }

    #[test]
    fn test_query_is_kept() {
        let client = Client::new("http://hubble.local").unwrap();
        let req = client
            .new_get_request(&Context::background(), "v1/users/me?Authorization=t")
            .unwrap();
        assert_eq!(req.url().query(), Some("Authorization=t"));
    }

    // ── Request bodies ──────────────────────────────────────────────

    #[test]
    fn test_no_body_no_content_type() {
        let client = Client::new("http://hubble.local").unwrap();
        let req = client.new_get_request(&Context::background(), "v1/x").unwrap();
        assert!(req.body_bytes().is_none());
        assert!(req.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(req.method(), &reqwest::Method::GET);
    }

    #[test]
    fn test_json_body_keeps_html_characters() {
        let client = Client::new("http://hubble.local").unwrap();
        let body = serde_json::json!({ "q": "<a & b>" });
        let req = client.new_post_request(&Context::background(), "v1/x", &body).unwrap();

        assert_eq!(req.method(), &reqwest::Method::POST);
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.body_bytes().unwrap(), br#"{"q":"<a & b>"}"#);
    }

    #[test]
    fn test_general_request_method() {
        let client = Client::new("http://hubble.local").unwrap();
        let req = client
            .new_request(&Context::background(), reqwest::Method::DELETE, "v1/x", None::<&()>)
            .unwrap();
        assert_eq!(req.method(), &reqwest::Method::DELETE);
        assert!(req.body_bytes().is_none());
    }

    // ── Classification ──────────────────────────────────────────────

    #[test]
    fn test_is_err_response_boundaries() {
        assert!(is_err_response(199));
        assert!(!is_err_response(200));
        assert!(!is_err_response(302));
        assert!(!is_err_response(399));
        assert!(is_err_response(400));
        assert!(is_err_response(500));
    }

    proptest! {
        #[test]
        fn prop_is_err_response(code in any::<i32>()) {
            prop_assert_eq!(is_err_response(code), code < 200 || code > 399);
        }
    }

    // ── Execution against a mock server ─────────────────────────────

    #[test]
    fn test_do_json_decodes_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/v1/thing");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"a":1}"#);
        });

        let client = Client::new(&server.base_url()).unwrap();
        let (parts, payload): (ResponseParts, Payload) =
            client.get_json(&Context::background(), "v1/thing").unwrap();

        mock.assert();
        assert_eq!(parts.status, 200);
        assert!(!parts.is_error());
        assert_eq!(payload.a_value, 1);
    }

    #[test]
    fn test_do_json_decode_error_keeps_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/thing");
            then.status(200)
                .header("x-request-id", "req-42")
                .body("{not json");
        });

        let client = Client::new(&server.base_url()).unwrap();
        let err = client
            .get_json::<Payload>(&Context::background(), "v1/thing")
            .unwrap_err();

        assert!(matches!(err, HubbleError::Decode { .. }), "{err:?}");
        let response = err.response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.headers["x-request-id"], "req-42");
        assert_eq!(response.url.path(), "/v1/thing");
    }

    #[test]
    fn test_do_str_returns_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/text");
            then.status(200).body("apiVersion: v1\nkind: Config");
        });

        let client = Client::new(&server.base_url()).unwrap();
        let text = client.get_str(&Context::background(), "v1/text").unwrap();
        assert_eq!(text, "apiVersion: v1\nkind: Config");
    }

    #[test]
    fn test_do_str_error_status_carries_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/text");
            then.status(404).body("no such cluster");
        });

        let client = Client::new(&server.base_url()).unwrap();
        let err = client.get_str(&Context::background(), "v1/text").unwrap_err();
        match err {
            HubbleError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such cluster");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn test_post_sends_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/search")
                .header("content-type", "application/json")
                .body(r#"{"q":"<a & b>"}"#);
            then.status(201).body("{}");
        });

        let client = Client::new(&server.base_url()).unwrap();
        let ctx = Context::background();
        let req = client
            .new_post_request(&ctx, "v1/search", &serde_json::json!({ "q": "<a & b>" }))
            .unwrap();
        let (parts, _): (ResponseParts, serde_json::Value) = client.do_json(req).unwrap();

        mock.assert();
        assert_eq!(parts.status, 201);
    }

    #[test]
    fn test_plain_client_sends_no_authorization() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/v1/x").header_missing("authorization");
            then.status(200).body("ok");
        });

        let client = Client::new(&server.base_url()).unwrap();
        assert_eq!(client.auth(), &Auth::None);
        client.get_str(&Context::background(), "v1/x").unwrap();
        mock.assert();
    }

    #[test]
    fn test_basic_auth_on_every_call() {
        let server = MockServer::start();
        // "user:secret" in base64
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/x")
                .header("authorization", "Basic dXNlcjpzZWNyZXQ=");
            then.status(200).body("ok");
        });

        let client = Client::basic_auth(&server.base_url(), "user", "secret").unwrap();
        let ctx = Context::background();

        let req = client.new_get_request(&ctx, "v1/x").unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
        client.do_str(req).unwrap();
        client.get_str(&ctx, "v1/x").unwrap();

        mock.assert_calls(2);
    }

    #[test]
    fn test_basic_auth_with_proxy_mode() {
        let client = Client::basic_auth_with_proxy("http://hubble.local", "u", "p").unwrap();
        assert_eq!(client.auth(), &Auth::Basic(Credentials::new("u", "p")));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_mutual_tls_client_construction() {
        let dir = tempfile::tempdir().unwrap();
        let (cert_path, key_path) = crate::tls::tests::write_pair(dir.path());

        let client = Client::with_certs("https://hubble.local", &cert_path, &key_path, false).unwrap();
        assert_eq!(client.auth(), &Auth::None);

        let err = Client::with_certs("https://hubble.local", dir.path().join("nope.crt"), &key_path, false)
            .unwrap_err();
        assert!(matches!(err, HubbleError::CertificateLoad { .. }));
    }

    #[test]
    fn test_transport_error_is_not_retried() {
        struct Counting {
            inner: reqwest::blocking::Client,
            calls: Arc<AtomicUsize>,
        }

        impl Transport for Counting {
            fn execute(&self, request: reqwest::blocking::Request) -> reqwest::Result<Response> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.inner.execute(request)
            }
        }

        // Bind then drop a listener so the port refuses connections.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let calls = Arc::new(AtomicUsize::new(0));
        let transport = Counting { inner: reqwest::blocking::Client::new(), calls: calls.clone() };
        let client =
            Client::with_transport(&format!("http://127.0.0.1:{}", port), Auth::None, transport).unwrap();

        let err = client.get_str(&Context::background(), "v1/x").unwrap_err();
        assert!(err.is_transport(), "{err:?}");
        assert!(matches!(err, HubbleError::Transport(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_context_never_dispatches() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200).body("ok");
        });

        let token = CancelToken::new();
        token.cancel();
        let ctx = Context::background().cancel_token(token);

        let client = Client::new(&server.base_url()).unwrap();
        let err = client.get_str(&ctx, "v1/x").unwrap_err();

        assert!(matches!(err, HubbleError::Cancelled));
        mock.assert_calls(0);
    }

    #[test]
    fn test_cancel_while_in_flight_returns_promptly() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/slow");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        });

        let token = CancelToken::new();
        let ctx = Context::background().cancel_token(token.clone());
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            token.cancel();
        });

        let client = Client::new(&server.base_url()).unwrap();
        let started = std::time::Instant::now();
        let err = client.get_str(&ctx, "v1/slow").unwrap_err();
        let elapsed = started.elapsed();
        canceller.join().unwrap();

        assert!(matches!(err, HubbleError::Cancelled), "{err:?}");
        assert!(elapsed < Duration::from_secs(2), "returned after {elapsed:?}");
    }

    #[test]
    fn test_cancellable_context_still_completes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/x");
            then.status(200).body("done");
        });

        let ctx = Context::background().cancel_token(CancelToken::new());
        let client = Client::new(&server.base_url()).unwrap();
        assert_eq!(client.get_str(&ctx, "v1/x").unwrap(), "done");
    }

    #[test]
    fn test_deadline_aborts_slow_call() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/slow");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        });

        let client = Client::new(&server.base_url()).unwrap();
        let ctx = Context::with_timeout(Duration::from_millis(200));
        let err = client.get_str(&ctx, "v1/slow").unwrap_err();

        assert!(matches!(err, HubbleError::DeadlineExceeded), "{err:?}");
    }

    #[test]
    fn test_url_reachable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/up");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path("/moved");
            then.status(204);
        });

        assert!(is_url_reachable(&server.url("/up")));
        assert!(!is_url_reachable(&server.url("/moved")));
        assert!(!is_url_reachable("http://127.0.0.1:1/"));
    }
}
