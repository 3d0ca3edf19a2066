// curl command generation

use super::{CodeArtifact, Dialect};
use crate::body::{self, BodyDescriptor};
use crate::escape::shell_quoted;
use crate::har::Exchange;
use crate::headers::{clean_headers, cookie_value};

const CONTINUATION: &str = " \\";

/// The flags of a curl invocation, in emission order:
/// URL, method, headers, cookie, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlCommand {
    parts: Vec<String>,
}

impl CurlCommand {
    pub fn build<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> Self {
        let method = exchange.method();
        let mut parts = vec![format!("curl {}", shell_quoted(&exchange.request.url))];

        if method != "GET" {
            parts.push(format!("-X {}", shell_quoted(&method)));
        }

        for header in clean_headers(exchange, user_excludes) {
            parts.push(format!(
                "-H {}",
                shell_quoted(&format!("{}: {}", header.name, header.value))
            ));
        }

        if let Some(cookie) = cookie_value(exchange) {
            parts.push(format!("-b {}", shell_quoted(&cookie)));
        }

        if body::method_allows_body(&method) {
            parts.extend(body_flags(&body::decode(exchange)));
        }

        Self { parts }
    }

    /// One flag per line, joined by backslash continuations
    pub fn multiline(&self) -> CodeArtifact {
        let last = self.parts.len().saturating_sub(1);
        let lines = self
            .parts
            .iter()
            .enumerate()
            .map(|(idx, part)| {
                let indent = if idx == 0 { "" } else { "  " };
                let continuation = if idx < last { CONTINUATION } else { "" };
                format!("{}{}{}", indent, part, continuation)
            })
            .collect();
        CodeArtifact {
            dialect: Dialect::Curl,
            lines,
        }
    }

    pub fn oneline(&self) -> CodeArtifact {
        CodeArtifact {
            dialect: Dialect::CurlOneline,
            lines: vec![self.parts.join(" ")],
        }
    }
}

fn body_flags(body: &BodyDescriptor) -> Vec<String> {
    match body {
        BodyDescriptor::Json { raw, .. }
        | BodyDescriptor::UrlEncoded { raw }
        | BodyDescriptor::Raw { raw } => vec![format!("-d {}", shell_quoted(raw.trim()))],
        BodyDescriptor::Multipart { params } => params
            .iter()
            .map(|p| match &p.file_name {
                Some(file_name) => {
                    format!("-F {}", shell_quoted(&format!("{}=@{}", p.name, file_name)))
                }
                // literal values are never read as `@file` or `<file`
                None => format!(
                    "--form-string {}",
                    shell_quoted(&format!("{}={}", p.name, p.value.as_deref().unwrap_or("")))
                ),
            })
            .collect(),
        BodyDescriptor::None => Vec::new(),
    }
}

/// Multi-line curl command for an exchange
pub fn emit<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> CodeArtifact {
    CurlCommand::build(exchange, user_excludes).multiline()
}

/// Single-line curl command for an exchange
pub fn emit_oneline<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> CodeArtifact {
    CurlCommand::build(exchange, user_excludes).oneline()
}
