//! Rendering of requests and responses into single log lines.
//!
//! Both renderers are pure: the same input always yields the same line. Bodies are only included
//! when the content type is textual, decoded with the declared charset (UTF-8 otherwise).
//!
//! Headers are written as `name='v1,v2'` entries separated by `, `. Only the values are quoted,
//! and names appear in the lower-case form `http` normalizes them to.

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, Method, StatusCode, Uri,
};
use mime::Mime;
use std::fmt::Write;

use crate::body_wrapper::ReplayableBody;
use crate::error::Result;
use crate::types::ExcludedHeaders;

/// Renders a request about to be sent.
///
/// ```rust
/// use http::{HeaderMap, Method, Uri};
/// use rest_tracing::{render::render_request, ExcludedHeaders};
///
/// let line = render_request(
///     &Method::GET,
///     &Uri::from_static("http://svc/json"),
///     &HeaderMap::new(),
///     b"",
///     &ExcludedHeaders::default(),
/// );
/// assert_eq!(line, "Sending method=GET request to url=http://svc/json");
/// ```
pub fn render_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
    excluded: &ExcludedHeaders,
) -> String {
    let mut line = format!("Sending method={method} request to url={uri}");
    push_headers(&mut line, headers, excluded);

    if !body.is_empty() && is_text(headers) {
        push_body(&mut line, body, resolve_charset(headers));
    }
    line
}

/// Renders a received response.
///
/// The status text is the canonical reason phrase of the status code (empty for codes without
/// one), not a reason phrase the server may have sent on the wire.
///
/// Fails only when a textual body cannot be replayed.
pub fn render_response<B>(
    method: &Method,
    uri: &Uri,
    status: StatusCode,
    headers: &HeaderMap,
    body: &B,
    excluded: &ExcludedHeaders,
) -> Result<String>
where
    B: ReplayableBody + ?Sized,
{
    let mut line = format!(
        "Received status=\"{} {}\" response for method={method} request to url={uri}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    );
    push_headers(&mut line, headers, excluded);

    let length = content_length(headers);
    if length == Some(0) {
        return Ok(line);
    }

    if is_text(headers) && body.can_replay() {
        let content: Bytes = body.replay()?;
        push_body(&mut line, &content, resolve_charset(headers));
        return Ok(line);
    }

    match length {
        Some(length) => {
            let _ = write!(line, " with content of length {length}");
        }
        None => line.push_str(" with content of unknown length"),
    }
    match content_type(headers) {
        Some(content_type) => {
            let _ = write!(line, " and content type {content_type}");
        }
        None => line.push_str(" and unknown content type"),
    }
    Ok(line)
}

/// Advertised `Content-Length`, `None` when absent or unparsable.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Whether the content type can be shown as text: `text/*`, `*/xml`, `*/json`, `*/*+xml` or
/// `*/*+json`.
///
/// Only the type and subtype are inspected, so a malformed parameter does not hide a text body.
pub fn is_text(headers: &HeaderMap) -> bool {
    let Some(mime) = parse_essence(headers) else {
        return false;
    };
    if mime.type_() == mime::TEXT {
        return true;
    }
    let subtype = mime
        .essence_str()
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or_default();
    subtype == "xml" || subtype == "json" || subtype.ends_with("+xml") || subtype.ends_with("+json")
}

/// Charset declared by the content type, UTF-8 when absent, unknown or unparsable.
pub fn resolve_charset(headers: &HeaderMap) -> &'static Encoding {
    content_type_str(headers)
        .and_then(|value| value.parse::<Mime>().ok())
        .and_then(|mime| {
            mime.get_param(mime::CHARSET)
                .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
}

fn content_type_str(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE)?.to_str().ok()
}

/// `type/subtype` without parameters.
fn parse_essence(headers: &HeaderMap) -> Option<Mime> {
    let value = content_type_str(headers)?;
    let essence = value.split_once(';').map_or(value, |(essence, _)| essence);
    essence.trim().parse().ok()
}

fn push_headers(line: &mut String, headers: &HeaderMap, excluded: &ExcludedHeaders) {
    let rendered: Vec<String> = headers
        .keys()
        .filter(|name| !excluded.contains(name.as_str()))
        .map(|name| {
            let values: Vec<_> = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect();
            format!("{name}='{}'", values.join(","))
        })
        .collect();

    if !rendered.is_empty() {
        let _ = write!(line, ": headers:[{}]", rendered.join(", "));
    }
}

fn push_body(line: &mut String, body: &[u8], charset: &'static Encoding) {
    let (text, _) = charset.decode_without_bom_handling(body);
    let _ = write!(line, ": body:[{text}]");
}
