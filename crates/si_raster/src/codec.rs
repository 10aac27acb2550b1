//! Data-URL helpers for the mask wire format.
//!
//! The backend expects the raw base64 payload only. Anything handed to an
//! `<img>` or a canvas needs the `data:image/...;base64,` header back.

/// Header put in front of PNG payloads shown in the page.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Strip a `data:<mime>;base64,` header (if any) and surrounding whitespace.
pub fn strip_data_url(payload: &str) -> &str {
    let trimmed = payload.trim();
    if !trimmed.starts_with("data:") {
        return trimmed;
    }
    match trimmed.find(";base64,") {
        Some(idx) => trimmed[idx + ";base64,".len()..].trim_start(),
        None => match trimmed.find(',') {
            Some(idx) => trimmed[idx + 1..].trim_start(),
            None => trimmed,
        },
    }
}

/// Re-attach the PNG header to a raw base64 payload.
pub fn to_data_url(payload: &str) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, strip_data_url(payload))
}
