//! Immutable outbound request
//!
//! A [`SecureRequest`] carries everything about a call except the credential.
//! The Authorization header is owned by the transport and injected there,
//! never earlier; the builder refuses caller-supplied ones. A request is
//! consumed by dispatch, so one request maps to exactly one call.

use crate::error::{Error, Result};
use crate::secret::SecretBytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::fmt;

pub struct SecureRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: SecretBytes,
}

impl SecureRequest {
    pub fn post(url: impl Into<String>) -> SecureRequestBuilder {
        SecureRequestBuilder::new(Method::POST, url.into())
    }

    pub fn get(url: impl Into<String>) -> SecureRequestBuilder {
        SecureRequestBuilder::new(Method::GET, url.into())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &SecretBytes {
        &self.body
    }

    /// Tear the request into parts for dispatch. Consumes the request.
    pub(crate) fn into_parts(self) -> (Method, String, HeaderMap, SecretBytes) {
        (self.method, self.url, self.headers, self.body)
    }
}

impl fmt::Debug for SecureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body", &self.body)
            .finish()
    }
}

pub struct SecureRequestBuilder {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: SecretBytes,
    forbidden: Option<HeaderName>,
}

impl SecureRequestBuilder {
    fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: SecretBytes::new(Vec::new()),
            forbidden: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if name == AUTHORIZATION {
            self.forbidden = Some(name);
        } else {
            self.headers.insert(name, value);
        }
        self
    }

    /// Serialize a JSON body into guarded memory and set the content type.
    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(payload)?;
        self.body = SecretBytes::new(bytes);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn build(self) -> Result<SecureRequest> {
        if let Some(name) = self.forbidden {
            return Err(Error::ForbiddenHeader(name.to_string()));
        }
        if !self.url.starts_with("https://") {
            return Err(Error::InsecureUrl);
        }
        Ok(SecureRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        })
    }
}
