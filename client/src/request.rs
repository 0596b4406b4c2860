use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::SessionError;

/// Where a request is in its refresh-and-retry lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attempt {
    /// Not yet rejected. A rejection may trigger one refresh.
    #[default]
    First,
    /// Already went through a refresh. A rejection is final.
    Retried,
}

/// An outgoing call, kept replayable: the body is owned bytes, not a stream.
///
/// `path` is resolved against the client's API base URL. Any `Authorization` header set here
/// is replaced by the current access token when the request is sent.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    attempt: Attempt,
}

impl SessionRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            attempt: Attempt::First,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, SessionError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| SessionError::InvalidRequest(format!("json body: {e}")))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        Ok(self)
    }

    /// Mark the request as having been through its refresh already.
    pub fn retried(mut self) -> Self {
        self.attempt = Attempt::Retried;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_body_and_content_type() {
        let req = SessionRequest::post("/api/v1/orders")
            .json(&serde_json::json!({ "qty": 2 }))
            .unwrap();

        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.body_bytes(), Some(br#"{"qty":2}"#.as_slice()));
        assert_eq!(req.attempt(), Attempt::First);
        assert_eq!(req.retried().attempt(), Attempt::Retried);
    }
}
