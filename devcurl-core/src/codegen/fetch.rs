// fetch() call generation

use super::{CodeArtifact, Dialect, form_data_prelude, headers_object, pretty_value};
use crate::body::{self, BodyDescriptor};
use crate::escape::js_quoted;
use crate::har::Exchange;
use crate::headers::clean_headers;

/// Generate a `fetch()` call for an exchange.
///
/// Options appear in the order method, headers, body and are left out when empty.
/// A multipart body is built in statements ahead of the call.
pub fn emit<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> CodeArtifact {
    let method = exchange.method();
    let headers = clean_headers(exchange, user_excludes);
    let url = js_quoted(&exchange.request.url);

    let mut artifact = CodeArtifact::new(Dialect::Fetch);
    let mut options: Vec<String> = Vec::new();

    if method != "GET" {
        options.push(format!("  method: {}", js_quoted(&method)));
    }

    if !headers.is_empty() {
        options.push(format!("  headers: {}", headers_object(&headers)));
    }

    if body::method_allows_body(&method) {
        match body::decode(exchange) {
            BodyDescriptor::Json {
                data: Some(data), ..
            } => {
                options.push(format!(
                    "  body: JSON.stringify({})",
                    pretty_value(&data, "    ")
                ));
            }
            BodyDescriptor::Json { data: None, raw }
            | BodyDescriptor::UrlEncoded { raw }
            | BodyDescriptor::Raw { raw } => {
                options.push(format!("  body: {}", js_quoted(&raw)));
            }
            BodyDescriptor::Multipart { params } => {
                artifact.lines.extend(form_data_prelude(&params));
                options.push("  body: formData".to_string());
            }
            BodyDescriptor::None => {}
        }
    }

    if options.is_empty() {
        artifact.push(format!("const response = await fetch({});", url));
    } else {
        artifact.push(format!("const response = await fetch({}, {{", url));
        artifact.push(options.join(",\n"));
        artifact.push("});");
    }

    artifact.push("");
    artifact.push("const data = await response.json();");
    artifact
}
