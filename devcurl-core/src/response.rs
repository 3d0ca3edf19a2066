// Response summaries for a captured exchange

use crate::har::{Exchange, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Short description of a response, suitable for a one-line listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub status_code: u16,
    pub status_text: String,
    pub content_type: String,
    pub response_time_ms: u64,
    pub size_bytes: u64,
}

/// Full response view: headers plus the body, parsed when it is JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    pub headers: Vec<Header>,
    pub body: String,
    pub body_parsed: Option<Value>,
    pub mime_type: String,
}

impl ResponseDetail {
    /// Pretty JSON when the body parsed, the raw text otherwise
    pub fn display_body(&self) -> String {
        match &self.body_parsed {
            Some(parsed) => {
                serde_json::to_string_pretty(parsed).unwrap_or_else(|_| self.body.clone())
            }
            None => self.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            500.. => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Success => "2xx",
            StatusClass::Redirect => "3xx",
            StatusClass::ClientError => "4xx",
            StatusClass::ServerError => "5xx",
            StatusClass::Other => "other",
        }
    }
}

/// Strip parameters such as `; charset=utf-8` from a content type
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Content type of the response: the last `content-type` header, else the declared mime type.
/// Returned untrimmed of parameters.
fn raw_content_type(exchange: &Exchange) -> String {
    match last_content_type_header(exchange) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => exchange.response.content.mime_type.clone(),
    }
}

fn last_content_type_header(exchange: &Exchange) -> Option<&str> {
    exchange
        .response
        .headers
        .iter()
        .filter(|h| h.name.trim().eq_ignore_ascii_case("content-type"))
        .map(|h| h.value.trim())
        .next_back()
}

/// Content type from the response headers alone, without parameters
pub fn header_content_type(exchange: &Exchange) -> Option<String> {
    last_content_type_header(exchange)
        .map(essence)
        .filter(|mime| !mime.is_empty())
}

/// The response's content type without parameters, or `None` when nothing was declared
pub fn content_type(exchange: &Exchange) -> Option<String> {
    let mime = essence(&raw_content_type(exchange));
    (!mime.is_empty()).then_some(mime)
}

pub fn summarize(exchange: &Exchange) -> ResponseSummary {
    let response = &exchange.response;
    ResponseSummary {
        status_code: response.status,
        status_text: response.status_text.clone(),
        content_type: content_type(exchange).unwrap_or_default(),
        response_time_ms: exchange.time.max(0.0).round() as u64,
        size_bytes: response.content.size.unwrap_or(0).max(0) as u64,
    }
}

/// Extract headers, body and (for JSON) the parsed body. A body that fails to parse
/// leaves `body_parsed` empty.
pub fn extract(exchange: &Exchange) -> ResponseDetail {
    let response = &exchange.response;
    let headers = response
        .headers
        .iter()
        .filter(|h| !h.name.trim().is_empty())
        .map(|h| Header::new(h.name.trim(), h.value.trim()))
        .collect();

    let mime_type = raw_content_type(exchange);
    let body = response.content.text.clone().unwrap_or_default();

    let body_parsed = if mime_type.to_lowercase().contains("application/json") && !body.is_empty() {
        serde_json::from_str(&body).ok()
    } else {
        None
    };

    ResponseDetail {
        headers,
        body,
        body_parsed,
        mime_type: essence(&mime_type),
    }
}
