//! API Gateway Client: every call to the Progress Engine goes through here.
//!
//! One request per call, no retry and no client-side timeout. Error replies are
//! normalized into `ClientError`, and a "student not found" 404 purges the
//! session and redirects to login before anything else happens.

use reqwest::{
    header::{CONTENT_TYPE, USER_AGENT},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::client::error::ClientError;
use crate::client::navigation::Page;
use crate::client::session::SessionContext;
use crate::util::{contains_ci, trunc_for_log};

const STALE_SESSION_MESSAGE: &str = "student not found";

/// Successful reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        match self {
            ApiBody::Json(v) => Ok(serde_json::from_value(v)?),
            ApiBody::Text(t) => Ok(serde_json::from_str(&t)?),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, session }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn call(&self, path: &str, method: Method, body: Option<&Value>) -> Result<ApiBody, ClientError> {
        self.call_with_query(path, method, &[], body).await
    }

    #[instrument(level = "debug", skip_all, fields(%method, %path))]
    pub async fn call_with_query(
        &self,
        path: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiBody, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method, &url)
            .header(USER_AGENT, concat!("edusmart/", env!("CARGO_PKG_VERSION")));
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(b) = body {
            req = req.header(CONTENT_TYPE, "application/json").body(b.to_string());
        }

        let res = req.send().await?;
        let status = res.status();

        if status.is_success() {
            let is_json = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.contains("application/json"));
            let text = res.text().await?;
            debug!(target: "edusmart", status = status.as_u16(), bytes = text.len(), "API call ok");
            return if is_json {
                Ok(ApiBody::Json(serde_json::from_str(&text)?))
            } else {
                Ok(ApiBody::Text(text))
            };
        }

        let text = res.text().await?;
        let payload = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "error": text }));

        let message = payload.get("error").and_then(Value::as_str).unwrap_or_default();
        if status.as_u16() == 404 && contains_ci(message, STALE_SESSION_MESSAGE) {
            warn!(target: "progress", %path, "Server no longer knows this student; purging session");
            if let Err(e) = self.session.clear() {
                warn!(target: "edusmart", error = %e, "Failed to clear session store");
            }
            self.session.navigate(Page::Login);
            return Err(ClientError::SessionInvalidated);
        }

        warn!(target: "edusmart", status = status.as_u16(), body = %trunc_for_log(&text, 200), "API call failed");
        Err(ClientError::Http { status: status.as_u16(), payload })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ClientError> {
        self.call_with_query(path, Method::GET, query, None).await?.decode()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let value = serde_json::to_value(body)?;
        self.call(path, Method::POST, Some(&value)).await?.decode()
    }
}
