// Request body codec: classify a captured body by its declared content type

use crate::har::{Exchange, PostParam};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Characters `encodeURIComponent` leaves alone, everything else gets percent-encoded
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The decoded shape of a request body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyDescriptor {
    /// JSON body. `data` is `None` when the text failed to parse.
    Json { data: Option<Value>, raw: String },
    UrlEncoded { raw: String },
    /// Structured form parts. File contents are never carried, only names.
    Multipart { params: Vec<PostParam> },
    Raw { raw: String },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Json,
    UrlEncoded,
    Multipart,
}

impl Codec {
    /// Checked in this order; the first match wins
    const PRIORITY: [Codec; 3] = [Codec::Json, Codec::UrlEncoded, Codec::Multipart];

    fn content_type(&self) -> &'static str {
        match self {
            Codec::Json => "application/json",
            Codec::UrlEncoded => "application/x-www-form-urlencoded",
            Codec::Multipart => "multipart/form-data",
        }
    }
}

impl BodyDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            BodyDescriptor::Json { .. } => "json",
            BodyDescriptor::UrlEncoded { .. } => "urlencoded",
            BodyDescriptor::Multipart { .. } => "multipart",
            BodyDescriptor::Raw { .. } => "raw",
            BodyDescriptor::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BodyDescriptor::None)
    }
}

/// Decode the request body of an exchange.
///
/// Never fails: malformed JSON is reported as `Json { data: None, .. }`.
pub fn decode(exchange: &Exchange) -> BodyDescriptor {
    let Some(post_data) = exchange.request.post_data.as_ref() else {
        return BodyDescriptor::None;
    };

    let mime_type = post_data.mime_type.to_lowercase();
    let text = post_data.text.as_deref().filter(|t| !t.is_empty());
    let params = &post_data.params;

    for codec in Codec::PRIORITY {
        if !mime_type.contains(codec.content_type()) {
            continue;
        }
        let decoded = match codec {
            Codec::Json => text.map(|raw| BodyDescriptor::Json {
                data: serde_json::from_str(raw).ok(),
                raw: raw.to_string(),
            }),
            Codec::UrlEncoded => match text {
                Some(raw) => Some(BodyDescriptor::UrlEncoded {
                    raw: raw.to_string(),
                }),
                None if !params.is_empty() => Some(BodyDescriptor::UrlEncoded {
                    raw: encode_params(params),
                }),
                None => None,
            },
            Codec::Multipart if !params.is_empty() => Some(BodyDescriptor::Multipart {
                params: params.clone(),
            }),
            Codec::Multipart => None,
        };
        if let Some(body) = decoded {
            return body;
        }
    }

    match text {
        Some(raw) => BodyDescriptor::Raw {
            raw: raw.to_string(),
        },
        None => BodyDescriptor::None,
    }
}

/// Percent-encode name/value pairs the way a browser builds a form body
pub fn encode_params(params: &[PostParam]) -> String {
    params
        .iter()
        .map(|p| {
            format!(
                "{}={}",
                encode_component(&p.name),
                encode_component(p.value.as_deref().unwrap_or(""))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Verbs that get a body in the curl and fetch forms
pub fn method_allows_body(method: &str) -> bool {
    !matches!(method.to_uppercase().as_str(), "GET" | "HEAD")
}

/// Verbs whose axios helper takes a data argument
pub fn method_takes_data(method: &str) -> bool {
    matches!(method.to_uppercase().as_str(), "POST" | "PUT" | "PATCH")
}
