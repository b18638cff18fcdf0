//! Guesses the bucket and path a stored `file_url` points at.
//!
//! Rows written before `bucket_name`/`file_path` existed only carry a
//! reference string whose shape depends on how the file was uploaded: a full
//! storage URL, a `{uuid}/{name}` path inside the default bucket, or a
//! `{bucket}/{path}` pair. The rules below are tried in order and the first
//! match wins. A wrong guess is not detected here; it shows up later as a
//! failed signing for that one file.

use crate::models::StorageRef;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_BUCKET: &str = "user_uploads";

static UUID_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}/")
        .expect("valid UUID prefix regex")
});

/// Resolve against the `user_uploads` default bucket.
pub fn resolve<S: AsRef<str>>(reference: &str, known_buckets: &[S]) -> StorageRef {
    resolve_with_default(reference, known_buckets, DEFAULT_BUCKET)
}

pub fn resolve_with_default<S: AsRef<str>>(
    reference: &str,
    known_buckets: &[S],
    default_bucket: &str,
) -> StorageRef {
    let is_known = |segment: &str| known_buckets.iter().any(|b| b.as_ref() == segment);

    if is_http_url(reference) {
        return resolve_url(reference, &is_known, default_bucket);
    }

    if UUID_PREFIX.is_match(reference) {
        return StorageRef::new(default_bucket, reference);
    }

    if let Some((first, rest)) = reference.split_once('/') {
        if is_known(first) {
            return StorageRef::new(first, rest);
        }
    }

    StorageRef::new(default_bucket, reference)
}

fn is_http_url(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn resolve_url(reference: &str, is_known: &dyn Fn(&str) -> bool, default_bucket: &str) -> StorageRef {
    // Signed URLs carry their token in the query string.
    let without_query = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);

    // scheme, empty, authority, path...
    let segments: Vec<&str> = without_query.split('/').collect();
    let path_segments = segments.get(3..).unwrap_or(&[]);

    for (idx, segment) in path_segments.iter().enumerate() {
        if is_known(segment) {
            let rest = path_segments[idx + 1..].join("/");
            if !rest.is_empty() {
                return StorageRef::new(*segment, rest);
            }
        }
    }

    let last = segments.last().copied().unwrap_or_default();
    StorageRef::new(default_bucket, last)
}

/// Resolver bound to a bucket list, for callers resolving many references.
#[derive(Debug, Clone)]
pub struct PathResolver {
    known_buckets: Vec<String>,
    default_bucket: String,
}

impl PathResolver {
    pub fn new(known_buckets: Vec<String>, default_bucket: impl Into<String>) -> Self {
        Self {
            known_buckets,
            default_bucket: default_bucket.into(),
        }
    }

    pub fn resolve(&self, reference: &str) -> StorageRef {
        resolve_with_default(reference, &self.known_buckets, &self.default_bucket)
    }

    pub fn known_buckets(&self) -> &[String] {
        &self.known_buckets
    }

    pub fn default_bucket(&self) -> &str {
        &self.default_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKETS: &[&str] = &["user_uploads", "avatars"];

    #[test]
    fn test_signed_url_resolves_bucket_and_path() {
        let r = resolve(
            "https://x.supabase.co/storage/v1/object/sign/user_uploads/abc123/photo.png",
            BUCKETS,
        );
        assert_eq!(r, StorageRef::new("user_uploads", "abc123/photo.png"));
    }

    #[test]
    fn test_url_query_string_is_dropped() {
        let r = resolve(
            "https://x.supabase.co/storage/v1/object/sign/avatars/u1/me.jpg?token=abc.def",
            BUCKETS,
        );
        assert_eq!(r, StorageRef::new("avatars", "u1/me.jpg"));
    }

    #[test]
    fn test_public_url_other_bucket() {
        let r = resolve(
            "http://cdn.example.org/storage/v1/object/public/avatars/2024/01/a.webp",
            BUCKETS,
        );
        assert_eq!(r, StorageRef::new("avatars", "2024/01/a.webp"));
    }

    #[test]
    fn test_url_without_known_bucket_uses_last_segment() {
        let r = resolve("https://example.com/files/misc/report.pdf", BUCKETS);
        assert_eq!(r, StorageRef::new("user_uploads", "report.pdf"));
    }

    #[test]
    fn test_url_host_is_not_a_bucket() {
        let r = resolve("https://avatars/other/x.png", BUCKETS);
        assert_eq!(r, StorageRef::new("user_uploads", "x.png"));
    }

    #[test]
    fn test_uppercase_scheme_is_a_url() {
        let r = resolve("HTTPS://x.co/storage/v1/object/sign/avatars/a.png", BUCKETS);
        assert_eq!(r, StorageRef::new("avatars", "a.png"));
    }

    #[test]
    fn test_uuid_prefixed_path_uses_default_bucket() {
        let input = "3fa85f64-5717-4562-b3fc-2c963f66afa6/report.pdf";
        let r = resolve(input, BUCKETS);
        assert_eq!(r, StorageRef::new("user_uploads", input));
    }

    #[test]
    fn test_uuid_prefixed_path_uppercase() {
        let input = "3FA85F64-5717-4562-B3FC-2C963F66AFA6/nested/scan.png";
        let r = resolve(input, BUCKETS);
        assert_eq!(r.bucket_name, "user_uploads");
        assert_eq!(r.file_path, input);
    }

    #[test]
    fn test_uuid_prefix_wins_over_bucket_split() {
        // A UUID can never be a bucket name here, but the order is still fixed.
        let buckets = ["3fa85f64-5717-4562-b3fc-2c963f66afa6"];
        let input = "3fa85f64-5717-4562-b3fc-2c963f66afa6/report.pdf";
        let r = resolve(input, &buckets);
        assert_eq!(r, StorageRef::new("user_uploads", input));
    }

    #[test]
    fn test_bucket_prefixed_path() {
        let r = resolve("avatars/officials/captain.jpg", BUCKETS);
        assert_eq!(r, StorageRef::new("avatars", "officials/captain.jpg"));
    }

    #[test]
    fn test_first_segment_must_match_exactly() {
        let r = resolve("avatars2/captain.jpg", BUCKETS);
        assert_eq!(r, StorageRef::new("user_uploads", "avatars2/captain.jpg"));
    }

    #[test]
    fn test_fallback_returns_reference_unchanged() {
        for input in ["photo.png", "some/unknown/path.txt", "", "not-a-uuid/x"] {
            let r = resolve(input, BUCKETS);
            assert_eq!(r, StorageRef::new("user_uploads", input));
        }
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let first = resolve("loose-file.docx", BUCKETS);
        let second = resolve(&first.file_path, BUCKETS);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_default_bucket() {
        let resolver = PathResolver::new(vec!["media".to_string()], "archive");
        assert_eq!(resolver.resolve("x.png"), StorageRef::new("archive", "x.png"));
        assert_eq!(resolver.resolve("media/x.png"), StorageRef::new("media", "x.png"));
    }
}
