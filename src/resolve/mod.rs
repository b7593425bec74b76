//! Stored-reference resolution
//!
//! References persisted by the surrounding application come in three shapes:
//! a bare object key, a full URL pointing at the bucket path, or a Supabase
//! storage URL (`.../storage/v1/object/<visibility>/{bucket}/{key}`). The
//! resolver normalizes all three to a bare key, or `None` when no key can be
//! recovered - callers treat `None` as "no object", never as a crash.

use crate::config::StorageConfig;
use std::borrow::Cow;

/// Internal route serving resolved project images
pub const PROJECT_IMAGE_ROUTE: &str = "/api/project-images";

/// Internal route serving resolved project documents
pub const PROJECT_DOCUMENT_ROUTE: &str = "/api/project-documents";

/// Recover the bare object key from a stored reference, using the bucket
/// configured in the environment.
///
/// Returns `None` for empty input, a URL that names neither the bucket path
/// nor the provider storage pattern, a malformed URL, or missing
/// configuration.
pub fn resolve_object_key(stored: &str) -> Option<String> {
    let config = StorageConfig::from_env().ok()?;
    resolve_key_in_bucket(stored, &config.bucket)
}

/// Recover the bare object key from a stored reference against an explicit
/// bucket name.
///
/// Idempotent on bare keys: a non-URL input is returned as-is with leading
/// slashes stripped.
pub fn resolve_key_in_bucket(stored: &str, bucket: &str) -> Option<String> {
    if stored.is_empty() {
        return None;
    }

    if !stored.starts_with("http://") && !stored.starts_with("https://") {
        return Some(stored.trim_start_matches('/').to_string());
    }

    let segments = decoded_path_segments(stored)?;

    // Direct bucket path: .../{bucket}/{key...}
    if let Some(idx) = segments.iter().position(|s| s == bucket) {
        if idx + 1 < segments.len() {
            return Some(segments[idx + 1..].join("/"));
        }
    }

    // Provider storage path: .../object/<visibility>/{bucket}/{key...}
    if let Some(object_idx) = segments.iter().position(|s| s == "object") {
        let bucket_idx = object_idx + 2;
        if segments.get(bucket_idx).map(String::as_str) == Some(bucket)
            && bucket_idx + 1 < segments.len()
        {
            return Some(segments[bucket_idx + 1..].join("/"));
        }
    }

    None
}

/// Build the internal image route for a stored reference
///
/// Resolves the key, then re-encodes each path segment so the result is a
/// stable browsable path regardless of how the value was originally stored.
pub fn project_image_path(stored: &str) -> Option<String> {
    resolve_object_key(stored).map(|key| build_route(PROJECT_IMAGE_ROUTE, &key))
}

/// Build the internal document route for a stored reference
pub fn project_document_path(stored: &str) -> Option<String> {
    resolve_object_key(stored).map(|key| build_route(PROJECT_DOCUMENT_ROUTE, &key))
}

fn build_route(prefix: &str, key: &str) -> String {
    let encoded = key
        .split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", prefix, encoded)
}

/// Split a URL's path into percent-decoded segments, dropping the empties
/// produced by leading or doubled slashes.
///
/// `None` for anything that doesn't parse as a URL with a host, or whose
/// segments don't decode to valid UTF-8.
fn decoded_path_segments(url: &str) -> Option<Vec<String>> {
    let after_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;

    let (authority, path) = match after_scheme.find('/') {
        Some(pos) => (&after_scheme[..pos], &after_scheme[pos..]),
        None => (after_scheme, ""),
    };

    if authority.is_empty() {
        return None;
    }

    let path = path
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let mut segments = Vec::new();
    for raw in path.split('/') {
        if raw.is_empty() {
            continue;
        }
        match urlencoding::decode(raw) {
            Ok(Cow::Borrowed(s)) => segments.push(s.to_string()),
            Ok(Cow::Owned(s)) => segments.push(s),
            Err(_) => return None,
        }
    }

    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_guard;

    #[test]
    fn test_bare_key_is_idempotent() {
        assert_eq!(
            resolve_key_in_bucket("a/b.png", "assets").as_deref(),
            Some("a/b.png")
        );
        assert_eq!(
            resolve_key_in_bucket("/a/b.png", "assets").as_deref(),
            Some("a/b.png")
        );
        assert_eq!(
            resolve_key_in_bucket("///a/b.png", "assets").as_deref(),
            Some("a/b.png")
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(resolve_key_in_bucket("", "assets"), None);
    }

    #[test]
    fn test_bucket_path_url() {
        assert_eq!(
            resolve_key_in_bucket("https://host/assets/projects/1/cover.png", "assets").as_deref(),
            Some("projects/1/cover.png")
        );
    }

    #[test]
    fn test_provider_storage_url() {
        assert_eq!(
            resolve_key_in_bucket(
                "https://host/storage/v1/object/public/assets/doc.pdf",
                "assets"
            )
            .as_deref(),
            Some("doc.pdf")
        );
        assert_eq!(
            resolve_key_in_bucket(
                "https://abc.supabase.co/storage/v1/object/sign/assets/projects/7/pitch.pdf",
                "assets"
            )
            .as_deref(),
            Some("projects/7/pitch.pdf")
        );
    }

    #[test]
    fn test_unrelated_url() {
        assert_eq!(
            resolve_key_in_bucket("https://unrelated.example/x/y", "assets"),
            None
        );
    }

    #[test]
    fn test_bucket_with_no_key_after() {
        assert_eq!(resolve_key_in_bucket("https://host/assets", "assets"), None);
        assert_eq!(
            resolve_key_in_bucket("https://host/assets/", "assets"),
            None
        );
    }

    #[test]
    fn test_encoded_segments_are_decoded() {
        assert_eq!(
            resolve_key_in_bucket("https://host/assets/My%20File%21.pdf", "assets").as_deref(),
            Some("My File!.pdf")
        );
    }

    #[test]
    fn test_malformed_url() {
        assert_eq!(resolve_key_in_bucket("https://", "assets"), None);
        assert_eq!(resolve_key_in_bucket("https:///assets/x", "assets"), None);
        // Percent sequence that does not decode to UTF-8
        assert_eq!(
            resolve_key_in_bucket("https://host/assets/%FF", "assets"),
            None
        );
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(
            resolve_key_in_bucket("https://host/assets/a/b.png?token=abc#frag", "assets")
                .as_deref(),
            Some("a/b.png")
        );
    }

    #[test]
    fn test_build_route_reencodes_segments() {
        assert_eq!(
            build_route(PROJECT_IMAGE_ROUTE, "projects/1/My File!.png"),
            "/api/project-images/projects/1/My%20File%21.png"
        );
    }

    #[test]
    fn test_route_builders_read_env() {
        let _guard = env_guard();
        std::env::set_var("S3_ENDPOINT", "https://s3.example.com");
        std::env::set_var("S3_ACCESS_KEY", "k");
        std::env::set_var("S3_SECRET_KEY", "s");
        std::env::set_var("S3_BUCKET", "assets");

        assert_eq!(
            project_image_path("https://host/assets/projects/1/cover.png").as_deref(),
            Some("/api/project-images/projects/1/cover.png")
        );
        assert_eq!(
            project_document_path("docs/pitch deck.pdf").as_deref(),
            Some("/api/project-documents/docs/pitch%20deck.pdf")
        );
        assert_eq!(project_image_path("https://unrelated.example/x/y"), None);

        for var in ["S3_ENDPOINT", "S3_ACCESS_KEY", "S3_SECRET_KEY", "S3_BUCKET"] {
            std::env::remove_var(var);
        }
    }
}
