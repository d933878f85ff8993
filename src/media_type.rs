//! Declared media categories and their storage representation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Extensions recognized for image-bearing categories.
static IMAGE_EXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.?(png|jpg|jpeg|webp|gif|gifv)$").expect("image extension pattern is valid")
});

/// The category tag attached to an archive request. Selects both the fetch
/// strategy and the stored file's extension and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Articles,
    Comics,
    Podcasts,
    Videos,
}

/// Resolved storage representation for a payload.
///
/// An empty `extension` means resolution failed (unknown category, or an
/// image category whose source URL carries no recognizable extension); the
/// caller must treat that as a configuration error rather than uploading
/// with empty type metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileType {
    pub extension: String,
    pub mime: String,
}

impl MediaType {
    /// Parse a declared category tag. Returns `None` for unknown tags.
    #[must_use]
    pub fn parse(declared: &str) -> Option<Self> {
        match declared {
            "articles" => Some(Self::Articles),
            "comics" => Some(Self::Comics),
            "podcasts" => Some(Self::Podcasts),
            "videos" => Some(Self::Videos),
            _ => None,
        }
    }

    /// Capitalized form used as the storage folder name.
    #[must_use]
    pub fn folder(self) -> &'static str {
        match self {
            Self::Articles => "Articles",
            Self::Comics => "Comics",
            Self::Podcasts => "Podcasts",
            Self::Videos => "Videos",
        }
    }

    /// Resolve the stored extension and MIME type for this category.
    ///
    /// Image-bearing categories take their extension from the source URL
    /// (case-folded); the other categories are fixed pairs.
    #[must_use]
    pub fn file_type(self, source_url: &str) -> FileType {
        match self {
            Self::Articles => FileType {
                extension: "md".to_string(),
                mime: "text/markdown".to_string(),
            },
            Self::Podcasts => FileType {
                extension: "mp3".to_string(),
                mime: "audio/mpeg".to_string(),
            },
            Self::Videos => FileType {
                extension: "mp4".to_string(),
                mime: "video/mp4".to_string(),
            },
            Self::Comics => IMAGE_EXT
                .captures(source_url)
                .map(|caps| {
                    let extension = caps[1].to_lowercase();
                    FileType {
                        mime: format!("image/{extension}"),
                        extension,
                    }
                })
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Articles => "articles",
            Self::Comics => "comics",
            Self::Podcasts => "podcasts",
            Self::Videos => "videos",
        };
        f.write_str(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(MediaType::parse("articles"), Some(MediaType::Articles));
        assert_eq!(MediaType::parse("videos"), Some(MediaType::Videos));
        assert_eq!(MediaType::parse("bookmarks"), None);
        assert_eq!(MediaType::parse(""), None);
    }

    #[test]
    fn test_fixed_pairs_ignore_url() {
        let ft = MediaType::Articles.file_type("https://example.com/whatever.png");
        assert_eq!(ft.extension, "md");
        assert_eq!(ft.mime, "text/markdown");

        let ft = MediaType::Podcasts.file_type("https://example.com/ep1");
        assert_eq!(ft.extension, "mp3");
        assert_eq!(ft.mime, "audio/mpeg");

        let ft = MediaType::Videos.file_type("https://example.com/v");
        assert_eq!(ft.extension, "mp4");
        assert_eq!(ft.mime, "video/mp4");
    }

    #[test]
    fn test_image_extension_case_folded() {
        let ft = MediaType::Comics.file_type("https://x/y/image.WEBP");
        assert_eq!(ft.extension, "webp");
        assert_eq!(ft.mime, "image/webp");

        let ft = MediaType::Comics.file_type("https://x/y/page.jpeg");
        assert_eq!(ft.extension, "jpeg");
        assert_eq!(ft.mime, "image/jpeg");
    }

    #[test]
    fn test_image_without_extension_is_unresolved() {
        let ft = MediaType::Comics.file_type("https://x/y/page");
        assert!(ft.extension.is_empty());
        assert!(ft.mime.is_empty());
    }
}
