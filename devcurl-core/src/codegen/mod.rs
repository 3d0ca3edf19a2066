// Code emitters: turn one captured exchange into call code in three dialects

pub mod axios;
pub mod curl;
pub mod fetch;

use crate::escape::{js_quoted, string_literal};
use crate::har::{Exchange, Header, PostParam};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Target calling convention of a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Curl,
    CurlOneline,
    Fetch,
    Axios,
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curl" => Ok(Dialect::Curl),
            "curl-oneline" | "oneline" => Ok(Dialect::CurlOneline),
            "fetch" => Ok(Dialect::Fetch),
            "axios" => Ok(Dialect::Axios),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Curl => "curl",
            Dialect::CurlOneline => "curl-oneline",
            Dialect::Fetch => "fetch",
            Dialect::Axios => "axios",
        }
    }
}

/// Generated source, one entry per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArtifact {
    pub dialect: Dialect,
    pub lines: Vec<String>,
}

impl CodeArtifact {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            lines: Vec::new(),
        }
    }

    /// Append text, splitting it on newlines
    pub fn push(&mut self, text: impl AsRef<str>) {
        self.lines
            .extend(text.as_ref().split('\n').map(|line| line.to_string()));
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for CodeArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Emit code for an exchange in the requested dialect
pub fn emit<S: AsRef<str>>(dialect: Dialect, exchange: &Exchange, user_excludes: &[S]) -> CodeArtifact {
    match dialect {
        Dialect::Curl => curl::emit(exchange, user_excludes),
        Dialect::CurlOneline => curl::emit_oneline(exchange, user_excludes),
        Dialect::Fetch => fetch::emit(exchange, user_excludes),
        Dialect::Axios => axios::emit(exchange, user_excludes),
    }
}

/// Two-space pretty JSON where every line after the first is prefixed with `indent`
pub(crate) fn pretty_value(value: &Value, indent: &str) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    pretty
        .split('\n')
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{ 'Name': 'value', ... }` spread over lines, closing brace indented by two spaces
pub(crate) fn headers_object(headers: &[Header]) -> String {
    let entries: Vec<String> = headers
        .iter()
        .map(|h| format!("    {}: {}", js_quoted(&h.name), js_quoted(&h.value)))
        .collect();
    format!("{{\n{}\n  }}", entries.join(",\n"))
}

/// Statements that build a `FormData` value named `formData`, followed by a blank line
pub(crate) fn form_data_prelude(params: &[PostParam]) -> Vec<String> {
    let mut lines = vec!["const formData = new FormData();".to_string()];
    for p in params {
        match &p.file_name {
            Some(file_name) => lines.push(format!(
                "formData.append({}, file); // {}",
                js_quoted(&p.name),
                string_literal(file_name)
            )),
            None => lines.push(format!(
                "formData.append({}, {});",
                js_quoted(&p.name),
                js_quoted(p.value.as_deref().unwrap_or(""))
            )),
        }
    }
    lines.push(String::new());
    lines
}
