//! URL utilities for provider endpoints
//!
//! Descriptors store a base endpoint; clients append operation paths such
//! as `chat/completions`, a model name, or a job id. These helpers keep
//! that joining free of doubled or missing slashes.

use std::error::Error;
use std::fmt;

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use nexora::utils::url::normalize_base_url;
///
/// let base = "https://api.replicate.com/v1";
/// assert_eq!(normalize_base_url("https://api.replicate.com/v1/"), base);
/// assert_eq!(normalize_base_url("https://api.replicate.com/v1///"), base);
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use nexora::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.openai.com/v1/", "/chat/completions"),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
        return normalized_base;
    }
    format!("{}/{}", normalized_base, endpoint)
}

/// A data-derived path segment that would change which resource a URL
/// addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafePathSegment(pub String);

impl fmt::Display for UnsafePathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refusing path segment {:?}", self.0)
    }
}

impl Error for UnsafePathSegment {}

/// Append path segments that come from data (job ids, voice ids) rather
/// than from code.
///
/// Every character outside the unreserved set is percent-encoded,
/// including `/`, so a value always stays a single segment. `.` and `..`
/// are rejected. Empty segments are skipped.
///
/// ```
/// use nexora::utils::url::construct_api_url_with_segments;
///
/// assert_eq!(
///     construct_api_url_with_segments(
///         "https://api.elevenlabs.io/v1",
///         &["text-to-speech", "voice id"]
///     )
///     .unwrap(),
///     "https://api.elevenlabs.io/v1/text-to-speech/voice%20id"
/// );
/// assert!(construct_api_url_with_segments("https://api.elevenlabs.io/v1", &[".."]).is_err());
/// ```
pub fn construct_api_url_with_segments(
    base_url: &str,
    segments: &[&str],
) -> Result<String, UnsafePathSegment> {
    let path = segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| encode_segment(segment))
        .collect::<Result<Vec<_>, _>>()?
        .join("/");
    Ok(construct_api_url(base_url, &path))
}

/// Append a namespaced model name such as `microsoft/DialoGPT-medium`.
/// Each `/`-separated part is encoded and checked like a data segment.
pub fn construct_model_url(base_url: &str, model: &str) -> Result<String, UnsafePathSegment> {
    let parts: Vec<&str> = model.split('/').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(UnsafePathSegment(model.to_string()));
    }
    construct_api_url_with_segments(base_url, &parts)
}

fn encode_segment(segment: &str) -> Result<String, UnsafePathSegment> {
    if segment == "." || segment == ".." {
        return Err(UnsafePathSegment(segment.to_string()));
    }
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    Ok(encoded)
}
