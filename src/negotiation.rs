//! Content negotiation: picking `Accept` and `Content-Type` values.
//!
//! Both selectors prefer a JSON media type when one is offered and return it
//! exactly as given, parameters and casing included.

const JSON_MIME_TYPES: [&str; 2] = ["application/json", "application/vnd.api+json"];

/// The `Content-Type` used when an endpoint declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Returns `true` if `mime` names a JSON media type.
///
/// Only the part before the first `;` is compared, case-insensitively and
/// without trimming, so `application/json; charset=UTF8` matches but
/// `application/jsonp` and ` application/json` do not.
///
/// # Examples
///
/// ```
/// use apiclient::is_json_mime;
///
/// assert!(is_json_mime(Some("APPLICATION/JSON")));
/// assert!(!is_json_mime(Some("application/jsonp")));
/// assert!(!is_json_mime(None));
/// ```
pub fn is_json_mime(mime: Option<&str>) -> bool {
    let Some(mime) = mime else {
        return false;
    };
    let media_type = mime.split(';').next().unwrap_or_default();
    JSON_MIME_TYPES
        .iter()
        .any(|json| media_type.eq_ignore_ascii_case(json))
}

/// Chooses the `Accept` header value from the media types an endpoint produces.
///
/// Returns `None` when there are no candidates, the first JSON candidate when
/// there is one, and all candidates joined with `,` otherwise.
pub fn select_header_accept<C, S>(candidates: Option<C>) -> Option<String>
where
    C: AsRef<[S]>,
    S: AsRef<str>,
{
    let candidates = candidates?;
    let candidates = candidates.as_ref();
    if candidates.is_empty() {
        return None;
    }
    if let Some(json) = first_json(candidates) {
        return Some(json.to_string());
    }
    Some(
        candidates
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<&str>>()
            .join(","),
    )
}

/// Chooses the `Content-Type` header value from the media types an endpoint
/// consumes.
///
/// Falls back to `application/json` when there are no candidates, prefers the
/// first JSON candidate, and otherwise takes the first candidate.
pub fn select_header_content_type<C, S>(candidates: Option<C>) -> String
where
    C: AsRef<[S]>,
    S: AsRef<str>,
{
    let Some(candidates) = candidates else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };
    let candidates = candidates.as_ref();
    let Some(first) = candidates.first() else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };
    first_json(candidates)
        .unwrap_or_else(|| first.as_ref())
        .to_string()
}

fn first_json<S: AsRef<str>>(candidates: &[S]) -> Option<&str> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .find(|c| is_json_mime(Some(*c)))
}
