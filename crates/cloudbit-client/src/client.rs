//! cloudbit API client
//!
//! Authenticates with the `X-Auth-Token` header and speaks JSON against the
//! `v4` API. Every request is logged at TRACE level together with the
//! `X-Request-ID` the API answers with.

use crate::error::{ClientError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::trace;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.cloudbit.ch/";

const AUTH_HEADER: &str = "X-Auth-Token";
const REQUEST_ID_HEADER: &str = "X-Request-ID";
const PAGE_COUNT_HEADER: &str = "X-Pagination-Page-Count";
const TOTAL_COUNT_HEADER: &str = "X-Pagination-Total-Count";
const DEFAULT_PER_PAGE: u32 = 50;

/// Page selection for list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub page: u32,
    pub per_page: u32,
    /// Ask the API to return all entities, not only the ones of the
    /// current organization filter
    #[serde(skip_serializing_if = "std::ops::Not::not", serialize_with = "as_flag")]
    pub no_filter: bool,
}

fn as_flag<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            no_filter: true,
        }
    }
}

/// One page of a list response
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_count: u32,
    pub total_count: u32,
}

/// Builder for [`Client`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    token: String,
    endpoint: String,
    user_agent: Option<String>,
}

impl ClientBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut endpoint = self.endpoint;
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base = Url::parse(&endpoint)?;

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&self.token)
            .map_err(|_| ClientError::InvalidToken("contains invalid characters".to_string()))?;
        token.set_sensitive(true);
        headers.insert(AUTH_HEADER, token);

        let mut http = reqwest::Client::builder().default_headers(headers);
        if let Some(user_agent) = self.user_agent {
            http = http.user_agent(user_agent);
        }

        Ok(Client {
            http: http.build()?,
            base,
        })
    }
}

/// Authenticated cloudbit API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
}

impl Client {
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            token: token.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;
        let request = build(self.http.request(method.clone(), url.clone()));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                trace!(%method, %url, "request to `{} {}` resulted in `{}`", method, url, e);
                return Err(e.into());
            }
        };

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        trace!(
            %method,
            %url,
            request_id = %request_id,
            "request to `{} {}` resulted in `{}`",
            method,
            url,
            response.status()
        );

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Self::json(self.send(Method::GET, path, |r| r).await?).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::json(self.send(Method::POST, path, |r| r.json(body)).await?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::json(self.send(Method::PUT, path, |r| r.json(body)).await?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::json(self.send(Method::PATCH, path, |r| r.json(body)).await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, |r| r).await?;
        Ok(())
    }

    /// PATCH whose response body is ignored
    pub async fn patch_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PATCH, path, |r| r.json(body)).await?;
        Ok(())
    }

    /// POST whose response body is ignored
    pub async fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::POST, path, |r| r.json(body)).await?;
        Ok(())
    }

    /// Fetch a single page
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        cursor: Cursor,
    ) -> Result<Page<T>> {
        let response = self.send(Method::GET, path, |r| r.query(&cursor)).await?;
        let page_count = header_u32(&response, PAGE_COUNT_HEADER).unwrap_or(1);
        let total_count = header_u32(&response, TOTAL_COUNT_HEADER).unwrap_or_default();
        let items: Vec<T> = Self::json(response).await?;

        Ok(Page {
            total_count: if total_count == 0 { items.len() as u32 } else { total_count },
            items,
            page_count,
        })
    }

    /// Fetch all pages
    pub async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut cursor = Cursor::default();
        let mut items = Vec::new();

        loop {
            let page = self.list_page::<T>(path, cursor).await?;
            let done = page.items.is_empty() || cursor.page >= page.page_count;
            items.extend(page.items);
            if done {
                return Ok(items);
            }
            cursor.page += 1;
        }
    }

    /// Typed access to a collection endpoint
    pub fn collection<T>(&self, path: impl Into<String>) -> Collection<'_, T> {
        Collection {
            client: self,
            path: path.into(),
            _marker: PhantomData,
        }
    }
}

fn header_u32(response: &reqwest::Response, name: &str) -> Option<u32> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn api_error(status: StatusCode, body: &str) -> ClientError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<ErrorDetail>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.and_then(|e| e.message).or(b.message))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

/// A REST collection such as `v4/compute/networks`
pub struct Collection<'a, T> {
    pub(crate) client: &'a Client,
    pub(crate) path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Collection<'_, T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        self.client.list_all(&self.path).await
    }

    pub async fn list_page(&self, cursor: Cursor) -> Result<Page<T>> {
        self.client.list_page(&self.path, cursor).await
    }

    pub async fn get(&self, id: i64) -> Result<T> {
        self.client.get(&self.item_path(id)).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T> {
        self.client.post(&self.path, body).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: i64, body: &B) -> Result<T> {
        self.client.patch(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&self.item_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let client = Client::builder("token")
            .endpoint("https://api.example.test/base")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.test/base/");
        assert_eq!(
            client.url("v4/compute/networks").unwrap().as_str(),
            "https://api.example.test/base/v4/compute/networks"
        );
    }

    #[test]
    fn test_cursor_query() {
        let query = serde_json::to_value(Cursor::default()).unwrap();
        assert_eq!(
            query,
            serde_json::json!({"page": 1, "per_page": 50, "no_filter": 1})
        );

        let query = serde_json::to_value(Cursor {
            no_filter: false,
            ..Cursor::default()
        })
        .unwrap();
        assert!(query.get("no_filter").is_none());
    }

    #[test]
    fn test_api_error_message() {
        let err = api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":{"message":"cidr is invalid"}}"#,
        );
        assert_eq!(err.to_string(), "API error (422): cidr is invalid");

        let err = api_error(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error (404): Not Found");
    }
}
