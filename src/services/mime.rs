pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

const SUFFIX_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("zip", "application/zip"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
];

/// Content type from the file name suffix, case-insensitive.
pub fn content_type_for(name: &str) -> &'static str {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_CONTENT_TYPE;
    };
    if stem.is_empty() {
        return FALLBACK_CONTENT_TYPE;
    }
    let ext = ext.to_ascii_lowercase();
    SUFFIX_TYPES
        .iter()
        .find(|(suffix, _)| *suffix == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_suffixes() {
        assert_eq!(content_type_for("photo.PNG"), "image/png");
        assert_eq!(content_type_for("a/b/c.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("budget.xlsx"), "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
    }

    #[test]
    fn test_unknown_or_missing_suffix() {
        assert_eq!(content_type_for("README"), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for("archive.tar.xz"), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for(".hidden"), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for("dir.v2/file"), FALLBACK_CONTENT_TYPE);
    }
}
