// axios call generation

use super::{CodeArtifact, Dialect, form_data_prelude, headers_object, pretty_value};
use crate::body::{self, BodyDescriptor};
use crate::escape::js_quoted;
use crate::har::Exchange;
use crate::headers::clean_headers;

/// Methods with an `axios.verb` helper
const SHORTHAND_VERBS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// Generate an axios call for an exchange.
///
/// POST, PUT and PATCH use `axios.verb(url, data, config)`, with `null` for a
/// missing body. Other known verbs use `axios.verb(url, config)`. Any other
/// method goes through the `axios({ method, url, ... })` request form.
pub fn emit<S: AsRef<str>>(exchange: &Exchange, user_excludes: &[S]) -> CodeArtifact {
    let method = exchange.method();
    let verb = method.to_lowercase();
    let headers = clean_headers(exchange, user_excludes);
    let url = js_quoted(&exchange.request.url);

    let mut artifact = CodeArtifact::new(Dialect::Axios);
    let config = (!headers.is_empty()).then(|| headers_object(&headers));

    if !SHORTHAND_VERBS.contains(&verb.as_str()) {
        let mut options = vec![
            format!("  method: {}", js_quoted(&method)),
            format!("  url: {}", url),
        ];
        if body::method_allows_body(&method)
            && let Some(data) = data_argument(exchange, &mut artifact)
        {
            options.push(format!("  data: {}", data));
        }
        if let Some(headers) = config {
            options.push(format!("  headers: {}", headers));
        }
        artifact.push("const { data } = await axios({");
        artifact.push(options.join(",\n"));
        artifact.push("});");
        return artifact;
    }

    if body::method_takes_data(&method) {
        let data = data_argument(exchange, &mut artifact).unwrap_or_else(|| "null".to_string());

        match config {
            Some(headers) => {
                artifact.push(format!(
                    "const {{ data }} = await axios.{}({}, {}, {{",
                    verb, url, data
                ));
                artifact.push(format!("  headers: {}", headers));
                artifact.push("});");
            }
            None => artifact.push(format!(
                "const {{ data }} = await axios.{}({}, {});",
                verb, url, data
            )),
        }
    } else {
        match config {
            Some(headers) => {
                artifact.push(format!("const {{ data }} = await axios.{}({}, {{", verb, url));
                artifact.push(format!("  headers: {}", headers));
                artifact.push("});");
            }
            None => artifact.push(format!("const {{ data }} = await axios.{}({});", verb, url)),
        }
    }

    artifact
}

/// The body as a JS expression. A multipart body adds its `formData` statements to `artifact`.
fn data_argument(exchange: &Exchange, artifact: &mut CodeArtifact) -> Option<String> {
    match body::decode(exchange) {
        BodyDescriptor::Json {
            data: Some(data), ..
        } => Some(pretty_value(&data, "  ")),
        BodyDescriptor::Multipart { params } => {
            artifact.lines.extend(form_data_prelude(&params));
            Some("formData".to_string())
        }
        BodyDescriptor::Json { data: None, raw }
        | BodyDescriptor::UrlEncoded { raw }
        | BodyDescriptor::Raw { raw } => Some(js_quoted(&raw)),
        BodyDescriptor::None => None,
    }
}
