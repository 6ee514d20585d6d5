//! Thin request layer shared by the auth and PostgREST clients

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// One outgoing JSON request, built up then sent
pub struct FetchBuilder<'a> {
    client: &'a Client,
    method: Method,
    url: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    payload: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl<'a> FetchBuilder<'a> {
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            client,
            method,
            url: url.to_string(),
            headers,
            params: Vec::new(),
            payload: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::config(format!("Invalid header name: {}", name)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| Error::config(format!("Invalid header value for {}", name)))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Merge a prepared header map, overriding what is already set
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn bearer_auth(self, token: &str) -> Result<Self> {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append query parameters; order is kept as given
    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.params.extend_from_slice(params);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn prepare(&self) -> Result<RequestBuilder> {
        let url = Url::parse(&self.url)?;
        debug!("{} {} {:?}", self.method, url, self.params);

        let mut request = self
            .client
            .request(self.method.clone(), url)
            .headers(self.headers.clone())
            .query(&self.params);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(payload) = &self.payload {
            request = request.body(payload.clone());
        }
        Ok(request)
    }

    /// Send and return the raw body. Non-2xx statuses become `Error::Api`.
    pub async fn execute_text(&self) -> Result<String> {
        let response = self.prepare()?.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::from_response_body(status, body))
        }
    }

    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.execute_text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like `execute`, but an empty body reads as `null`
    pub async fn execute_value(&self) -> Result<Value> {
        let body = self.execute_text().await?;
        if body.trim().is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }
}

/// Entry points for each HTTP method the clients use
pub struct Fetch;

impl Fetch {
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}
