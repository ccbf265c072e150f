//! Authenticated HTTP client for the iControl REST interface.
//!
//! One [`DeviceClient`] per device. Verb-shaped helpers (`collection`,
//! `create`, `replace`, `modify`, `remove`) wrap the raw endpoints; every
//! higher-level operation in `bigsync-core` reduces to one of them.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthScheme, Credentials};
use crate::error::Error;

const AUTH_TOKEN_HEADER: &str = "X-F5-Auth-Token";
const LOGIN_PATH: &str = "shared/authn/login";

// ── Connection settings ─────────────────────────────────────────────

/// Everything needed to reach one device's management interface.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Host or URL of the management interface. A bare `host[:port]` is
    /// promoted to `https://host[:port]`.
    pub url: String,
    pub credentials: Credentials,
    pub auth: AuthScheme,
    /// Accept self-signed management certificates. Lab devices ship with
    /// them; leave off anywhere that matters.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl Connection {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            auth: AuthScheme::default(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Async client for one device. Cheap to share behind an `Arc`; the auth
/// token is refreshed in place when the device rejects it.
pub struct DeviceClient {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
    auth: AuthScheme,
    token: RwLock<Option<String>>,
}

impl DeviceClient {
    pub fn new(connection: Connection) -> Result<Self, Error> {
        let base = normalize_base_url(&connection.url)?;

        let mut builder = reqwest::Client::builder()
            .timeout(connection.timeout)
            .user_agent(concat!("bigsync/", env!("CARGO_PKG_VERSION")));
        if connection.accept_invalid_certs {
            warn!(device = %base, "TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|source| Error::ClientBuild { source })?;

        Ok(Self {
            http,
            base,
            credentials: connection.credentials,
            auth: connection.auth,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Obtain an auth token from `shared/authn/login` and store it for
    /// subsequent requests. Called lazily by [`send`](Self::send); exposed
    /// so callers can verify credentials up front.
    pub async fn login(&self) -> Result<(), Error> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            username: &'a str,
            password: &'a str,
            #[serde(rename = "loginProviderName")]
            login_provider_name: &'a str,
        }
        #[derive(serde::Deserialize)]
        struct LoginToken {
            token: String,
        }
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            token: LoginToken,
        }

        let url = self.endpoint(LOGIN_PATH);
        let body = LoginRequest {
            username: &self.credentials.username,
            password: self.credentials.password.expose_secret(),
            login_provider_name: "tm",
        };

        debug!(url = %url, user = %self.credentials.username, "requesting auth token");
        let response = self
            .http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| Error::Transport {
                method: "POST".into(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth {
                url: url.to_string(),
                reason: format!("login returned {status}"),
            });
        }

        let text = response.text().await.map_err(|source| Error::Transport {
            method: "POST".into(),
            url: url.to_string(),
            source,
        })?;
        let parsed: LoginResponse =
            serde_json::from_str(&text).map_err(|_| Error::Auth {
                url: url.to_string(),
                reason: "login response carried no token".into(),
            })?;

        *self.token.write().await = Some(parsed.token.token);
        Ok(())
    }

    // ── Verb helpers ────────────────────────────────────────────────

    /// Fetch every item of a collection that lives in `partition`.
    ///
    /// The device omits the `items` field entirely when the collection is
    /// empty, so absence decodes as an empty list.
    pub async fn collection<T: DeserializeOwned>(
        &self,
        path: &str,
        partition: &str,
        expand_subcollections: bool,
    ) -> Result<Vec<T>, Error> {
        #[derive(serde::Deserialize)]
        struct Collection<T> {
            #[serde(default = "Vec::new")]
            items: Vec<T>,
        }

        let mut url = self.endpoint(path);
        url.query_pairs_mut()
            .append_pair("$filter", &format!("partition eq {partition}"));
        if expand_subcollections {
            url.query_pairs_mut()
                .append_pair("expandSubcollections", "true");
        }

        let text = self.send(Method::GET, url.clone(), None).await?;
        let parsed: Collection<T> = serde_json::from_str(&text)
            .map_err(|source| Error::Decode {
                url: url.to_string(),
                source,
            })?;
        Ok(parsed.items)
    }

    /// POST a new object into a collection.
    pub async fn create<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let value = encode(body)?;
        self.send(Method::POST, self.endpoint(path), Some(&value))
            .await
            .map(drop)
    }

    /// PUT a full replacement of `id` within a collection.
    pub async fn replace<B: Serialize + Sync>(
        &self,
        path: &str,
        id: &str,
        body: &B,
    ) -> Result<(), Error> {
        let value = encode(body)?;
        self.send(Method::PUT, self.item_url(path, id), Some(&value))
            .await
            .map(drop)
    }

    /// PATCH selected fields of `id` within a collection.
    pub async fn modify<B: Serialize + Sync>(
        &self,
        path: &str,
        id: &str,
        body: &B,
    ) -> Result<(), Error> {
        let value = encode(body)?;
        self.send(Method::PATCH, self.item_url(path, id), Some(&value))
            .await
            .map(drop)
    }

    /// DELETE `id` from a collection.
    pub async fn remove(&self, path: &str, id: &str) -> Result<(), Error> {
        self.send(Method::DELETE, self.item_url(path, id), None)
            .await
            .map(drop)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.push("mgmt");
            segments.extend(path.split('/'));
        }
        url
    }

    fn item_url(&self, path: &str, id: &str) -> Url {
        let mut url = self.endpoint(path);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    /// Issue one request with auth attached. A rejected token triggers a
    /// single re-login before the error is surfaced.
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<String, Error> {
        let mut attempted_relogin = false;
        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            request = match self.auth {
                AuthScheme::Basic => request.basic_auth(
                    &self.credentials.username,
                    Some(self.credentials.password.expose_secret()),
                ),
                AuthScheme::Token => {
                    if self.token.read().await.is_none() {
                        self.login().await?;
                    }
                    let guard = self.token.read().await;
                    match guard.as_deref() {
                        Some(token) => request.header(AUTH_TOKEN_HEADER, token),
                        None => {
                            return Err(Error::Auth {
                                url: url.to_string(),
                                reason: "no auth token after login".into(),
                            });
                        }
                    }
                }
            };
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, "device request");
            let response = request.send().await.map_err(|source| Error::Transport {
                method: method.to_string(),
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED
                && self.auth == AuthScheme::Token
                && !attempted_relogin
            {
                warn!(url = %url, "auth token rejected, logging in again");
                *self.token.write().await = None;
                attempted_relogin = true;
                continue;
            }

            let text = response.text().await.map_err(|source| Error::Transport {
                method: method.to_string(),
                url: url.to_string(),
                source,
            })?;
            if !status.is_success() {
                return Err(Error::Status {
                    method: method.to_string(),
                    url: url.to_string(),
                    status: status.as_u16(),
                    message: extract_device_message(&text),
                });
            }
            return Ok(text);
        }
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|source| Error::Encode { source })
}

fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| Error::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(Error::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "missing host".into(),
        });
    }
    Ok(url)
}

/// Pull the human-readable message out of a device error body, falling back
/// to the (truncated) raw text.
fn extract_device_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct DeviceError {
        message: String,
    }
    if let Ok(parsed) = serde_json::from_str::<DeviceError>(body) {
        return parsed.message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".into();
    }
    let mut message: String = trimmed.chars().take(200).collect();
    if message.len() < trimmed.len() {
        message.push_str("...");
    }
    message
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> DeviceClient {
        let connection = Connection::new(
            url,
            Credentials::new("admin", "secret"),
        );
        DeviceClient::new(connection).unwrap()
    }

    #[test]
    fn base_url_defaults_to_https() {
        let url = normalize_base_url("bigip.example.net").unwrap();
        assert_eq!(url.as_str(), "https://bigip.example.net/");
    }

    #[test]
    fn base_url_keeps_explicit_port_and_scheme() {
        let url = normalize_base_url("https://10.0.0.5:8443/").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(normalize_base_url("https://").is_err());
    }

    #[test]
    fn endpoint_lives_under_mgmt() {
        let client = client_for("https://bigip.example.net");
        let url = client.endpoint(crate::paths::POOL);
        assert_eq!(
            url.as_str(),
            "https://bigip.example.net/mgmt/tm/ltm/pool"
        );
    }

    #[test]
    fn item_url_percent_encodes_route_domains() {
        let client = client_for("https://bigip.example.net");
        let url = client.item_url(crate::paths::NODE, "~Common~10.2.3.5%0");
        assert_eq!(
            url.as_str(),
            "https://bigip.example.net/mgmt/tm/ltm/node/~Common~10.2.3.5%250"
        );
    }

    #[test]
    fn device_message_prefers_json_message_field() {
        let body = r#"{"code":409,"message":"01020066:3: The requested Pool (/Common/p1) already exists."}"#;
        assert_eq!(
            extract_device_message(body),
            "01020066:3: The requested Pool (/Common/p1) already exists."
        );
    }

    #[test]
    fn device_message_falls_back_to_raw_text() {
        assert_eq!(extract_device_message("  busted  "), "busted");
        assert_eq!(extract_device_message(""), "(empty body)");
    }
}
