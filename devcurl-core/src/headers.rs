// Header classification: which request headers are signal and which are browser noise

use crate::har::{Exchange, Header};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Headers a browser adds on its own. This is also the default user filter list.
pub const BROWSER_HEADERS: &[&str] = &[
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-platform",
    "sec-ch-ua-full-version-list",
    "sec-ch-ua-arch",
    "sec-ch-ua-bitness",
    "sec-ch-ua-model",
    "sec-fetch-dest",
    "sec-fetch-mode",
    "sec-fetch-site",
    "sec-fetch-user",
    "upgrade-insecure-requests",
    "priority",
    ":method",
    ":authority",
    ":scheme",
    ":path",
];

/// Transport and browser-identity headers that are never part of generated code
pub const TRANSPORT_HEADERS: &[&str] = &[
    "accept-encoding",
    "accept-language",
    "connection",
    "host",
    "user-agent",
    "referer",
    "origin",
];

/// Caching hints that are dropped in addition to the transport headers
pub const CACHE_HEADERS: &[&str] = &["cache-control", "pragma", "dnt"];

/// Decide whether a request header belongs in generated code.
///
/// Browser noise, transport headers, caching hints and `cookie` are always dropped.
/// Anything on `user_excludes` is dropped too. Comparison is case-insensitive.
pub fn include<S: AsRef<str>>(name: &str, user_excludes: &[S]) -> bool {
    let lower = name.trim().to_lowercase();

    if lower == "cookie" {
        return false;
    }

    let builtin = BROWSER_HEADERS
        .iter()
        .chain(TRANSPORT_HEADERS)
        .chain(CACHE_HEADERS);
    for noise in builtin {
        if *noise == lower {
            return false;
        }
    }

    !is_filtered(&lower, user_excludes)
}

/// True when `name` appears (case-insensitively) in `filtered`
pub fn is_filtered<S: AsRef<str>>(name: &str, filtered: &[S]) -> bool {
    let lower = name.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    filtered
        .iter()
        .any(|entry| entry.as_ref().to_lowercase() == lower)
}

/// Request headers that survive filtering, trimmed, in their original order
pub fn clean_headers<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> Vec<Header> {
    exchange
        .request
        .headers
        .iter()
        .filter_map(|h| {
            let name = h.name.trim();
            if name.is_empty() || !include(name, user_excludes) {
                return None;
            }
            Some(Header::new(name, h.value.trim()))
        })
        .collect()
}

/// Value of the request's cookie header, if it carried a non-empty one
pub fn cookie_value(exchange: &Exchange) -> Option<String> {
    exchange
        .request
        .headers
        .iter()
        .filter(|h| h.name.trim().eq_ignore_ascii_case("cookie"))
        .map(|h| h.value.trim().to_string())
        .rfind(|v| !v.is_empty())
}

/// Named starting points for the user filter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Browser noise plus transport headers
    Essential,
    /// Browser noise only
    Default,
    /// Filter nothing
    IncludeAll,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "essential" => Ok(Preset::Essential),
            "default" => Ok(Preset::Default),
            "include-all" | "all" => Ok(Preset::IncludeAll),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Essential => "essential",
            Preset::Default => "default",
            Preset::IncludeAll => "include-all",
        }
    }

    pub fn headers(&self) -> Vec<String> {
        match self {
            Preset::Essential => BROWSER_HEADERS
                .iter()
                .chain(TRANSPORT_HEADERS)
                .map(|s| s.to_string())
                .collect(),
            Preset::Default => BROWSER_HEADERS.iter().map(|s| s.to_string()).collect(),
            Preset::IncludeAll => Vec::new(),
        }
    }
}

/// Display grouping for filtered header names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderCategory {
    ClientHints,
    FetchMetadata,
    Http2Pseudo,
    OtherBrowser,
    Custom,
}

impl HeaderCategory {
    pub fn of(name: &str) -> Self {
        let name = name.to_lowercase();
        if name == "sec-ch-ua" || name.starts_with("sec-ch-ua-") {
            HeaderCategory::ClientHints
        } else if name.starts_with("sec-fetch-") {
            HeaderCategory::FetchMetadata
        } else if name.starts_with(':') {
            HeaderCategory::Http2Pseudo
        } else if name == "upgrade-insecure-requests" || name == "priority" {
            HeaderCategory::OtherBrowser
        } else {
            HeaderCategory::Custom
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeaderCategory::ClientHints => "Chromium Client Hints",
            HeaderCategory::FetchMetadata => "Fetch Metadata",
            HeaderCategory::Http2Pseudo => "HTTP/2 Pseudo-headers",
            HeaderCategory::OtherBrowser => "Other Browser Headers",
            HeaderCategory::Custom => "Custom",
        }
    }
}

/// The user's ordered, case-insensitively unique list of extra header exclusions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderFilterList(Vec<String>);

impl HeaderFilterList {
    /// Build from arbitrary names, lowercasing and dropping blanks and repeats
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self(Vec::new());
        for name in names {
            list.add(name.as_ref());
        }
        list
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(preset.headers())
    }

    /// Add a header name. Returns false (and changes nothing) for blank or already-listed names.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        if name.is_empty() || self.0.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    /// Remove a header name. Returns false when it was not listed.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        match self.0.iter().position(|h| *h == name) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        is_filtered(name, &self.0)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names grouped by category, categories in display order
    pub fn grouped(&self) -> Vec<(HeaderCategory, Vec<&str>)> {
        let mut groups: Vec<(HeaderCategory, Vec<&str>)> = Vec::new();
        for name in &self.0 {
            let category = HeaderCategory::of(name);
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, names)) => names.push(name.as_str()),
                None => groups.push((category, vec![name.as_str()])),
            }
        }
        groups.sort_by_key(|(c, _)| *c);
        groups
    }
}

impl Default for HeaderFilterList {
    fn default() -> Self {
        Self::from_preset(Preset::Default)
    }
}

impl AsRef<[String]> for HeaderFilterList {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
