//! Image type token to file extension mapping.

/// Extension used when a token is unknown or missing.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Map a one-character image type token to its file extension.
///
/// `"j"` is jpg, `"p"` is png, `"g"` is gif. Anything else, including the
/// empty string, falls back to jpg.
pub fn resolve_extension(token: &str) -> &'static str {
    match token {
        "j" => "jpg",
        "p" => "png",
        "g" => "gif",
        _ => DEFAULT_EXTENSION,
    }
}
