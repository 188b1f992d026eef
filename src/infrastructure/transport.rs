// DANA transport - Bearer-authenticated JSON requests over a cookie session
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("API {method} request to {url} failed with code {status}")]
    HttpStatus { method: Method, url: String, status: u16 },
    #[error("Login to {url} redirected to login page")]
    Authentication { url: String },
    #[error("API {method} request to {url} could not be sent")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// An HTTP session against one dashboard, carrying the API token and the
/// cookies set at login.
#[derive(Debug, Clone)]
pub struct DanaSession {
    client: Client,
    base_url: String,
    token: String,
}

impl DanaSession {
    pub fn new(base_url: &str, token: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<Response, TransportError> {
        self.send(Method::GET, url, payload).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<Response, TransportError> {
        self.send(Method::POST, url, payload).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        payload: &T,
    ) -> Result<Response, TransportError> {
        // `json` sets Content-Type: application/json, GET included.
        let response = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method: method.clone(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(%method, url, code = status.as_u16(), "API response code");

        if status != StatusCode::OK {
            return Err(TransportError::HttpStatus {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Log in and return the session to use for every later call.
///
/// The dashboard answers 200 for bad credentials too, sending the client back to
/// the login page; landing on the login URL is therefore the failure signal.
pub async fn login(base_url: &str, token: &str, username: &str, password: &str) -> Result<DanaSession, TransportError> {
    let session = DanaSession::new(base_url, token)?;
    let login_url = session.endpoint("/login");

    let response = session.post(&login_url, &Credentials { username, password }).await?;

    if response.url().as_str().trim_end_matches('/') == login_url {
        return Err(TransportError::Authentication {
            url: session.base_url().to_string(),
        });
    }

    tracing::info!(url = session.base_url(), username, "Logged in");
    Ok(session)
}
