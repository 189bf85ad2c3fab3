use std::fmt;

use serde_json::Value as JsonValue;
use url::Url;

use crate::{AtmError, Result};

const DEFAULT_CONTENT_TYPE: (&str, &str) = ("Content-Type", "application/json");

/// HTTP method of a [`JsonRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request description accepted by [`ResilientJsonClient::request`](crate::ResilientJsonClient::request).
#[derive(Clone, Debug, PartialEq)]
pub struct JsonRequest {
    pub url: String,
    pub method: HttpMethod,
    /// Caller headers, merged over `Content-Type: application/json`.
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl JsonRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Adds a header. A later header with the same (case-insensitive) name wins.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolves the wire form: query string for GET, JSON payload otherwise.
    pub(crate) fn prepare(&self) -> Result<HttpRequest> {
        let mut url = Url::parse(&self.url)
            .map_err(|err| AtmError::InvalidInput(format!("invalid url '{}': {err}", self.url)))?;

        let body = match (self.method, &self.body) {
            (_, None) => None,
            (HttpMethod::Get, Some(JsonValue::Null)) => None,
            (HttpMethod::Get, Some(JsonValue::Object(map))) => {
                let mut pairs = Vec::new();
                for (key, value) in map {
                    flatten_query(key.clone(), value, &mut pairs);
                }
                if !pairs.is_empty() {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
                None
            }
            (HttpMethod::Get, Some(other)) => {
                return Err(AtmError::InvalidInput(format!(
                    "GET request body must be a JSON object, got {other}"
                )));
            }
            (_, Some(value)) => Some(
                serde_json::to_string(value)
                    .map_err(|err| AtmError::InvalidInput(format!("unserializable body: {err}")))?,
            ),
        };

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers: merge_headers(&self.headers),
            body,
        })
    }
}

/// Fully resolved request handed to a [`Transport`](crate::Transport).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON document to send; always `None` for GET.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn merge_headers(extra: &[(String, String)]) -> Vec<(String, String)> {
    let mut headers = vec![(
        DEFAULT_CONTENT_TYPE.0.to_owned(),
        DEFAULT_CONTENT_TYPE.1.to_owned(),
    )];
    for (name, value) in extra {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.clone(), value.clone()));
    }
    headers
}

/// Form-encodes nested JSON as `key[sub]=value` / `key[0]=value` pairs.
fn flatten_query(key: String, value: &JsonValue, out: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Null => {}
        JsonValue::Bool(flag) => out.push((key, String::from(if *flag { "1" } else { "0" }))),
        JsonValue::Number(number) => out.push((key, number.to_string())),
        JsonValue::String(text) => out.push((key, text.clone())),
        JsonValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_query(format!("{key}[{index}]"), item, out);
            }
        }
        JsonValue::Object(map) => {
            for (sub, item) in map {
                flatten_query(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}
