//! Resolution of backend image paths to loadable URLs.
//!
//! The backend stores uploads under `/media/` but older records carry bare
//! paths such as `/post_images/x.jpg`. A source starts at the direct URL,
//! moves to the `/media`-prefixed variant on the first failure and ends at
//! an inline placeholder. There is never more than one retry.

use once_cell::sync::Lazy;
use regex::Regex;

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("Failed to compile absolute URL regex"));

static API_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/api/?$").expect("Failed to compile API suffix regex"));

/// Where an image is shown; decides the placeholder dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    /// Post card in the blog list
    Card,
    /// Header image of a post
    Hero,
    /// Sidebar thumbnail
    Thumbnail,
}

impl ImageSlot {
    /// (width, height, font size)
    fn placeholder_metrics(&self) -> (u32, u32, u32) {
        match self {
            ImageSlot::Card => (800, 400, 24),
            ImageSlot::Hero => (1200, 500, 28),
            ImageSlot::Thumbnail => (200, 140, 12),
        }
    }
}

/// Inline SVG reading "No image", as a `data:` URI
pub fn placeholder(slot: ImageSlot) -> String {
    let (width, height, font_size) = slot.placeholder_metrics();
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}'>\
         <rect width='100%' height='100%' fill='#f3f4f6'/>\
         <text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle' fill='#9ca3af' font-size='{font_size}'>No image</text>\
         </svg>"
    );
    format!("data:image/svg+xml;utf8,{}", urlencoding::encode(&svg))
}

/// Strip a trailing `/api` segment from the API URL to get the origin
/// that serves uploaded files
pub fn backend_origin(api_url: &str) -> String {
    API_SUFFIX.replace(api_url.trim(), "").into_owned()
}

#[derive(Debug, Clone)]
pub struct ImageResolver {
    origin: String,
}

impl ImageResolver {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_api_url(api_url: &str) -> Self {
        Self::new(backend_origin(api_url))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Direct URL for `raw`; absolute URLs pass through unchanged
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if ABSOLUTE_URL.is_match(raw) {
            return Some(raw.to_string());
        }
        Some(format!("{}{}", self.origin, rooted(raw)))
    }

    /// Alternate URL to try once the direct one fails. Absolute URLs have
    /// no alternate.
    pub fn fallback(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || ABSOLUTE_URL.is_match(raw) {
            return None;
        }
        let path = rooted(raw);
        if path.starts_with("/media/") {
            Some(format!("{}{}", self.origin, path))
        } else {
            Some(format!("{}/media{}", self.origin, path))
        }
    }

    /// Loading state for an image, `None` when there is nothing to show
    pub fn source(&self, raw: Option<&str>, slot: ImageSlot) -> Option<ImageSource> {
        let raw = raw?;
        let primary = self.resolve(raw)?;
        Some(ImageSource {
            primary,
            fallback: self.fallback(raw),
            slot,
            stage: Stage::Primary,
        })
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Primary,
    Fallback,
    Placeholder,
}

/// An image being loaded, advanced by `on_error`
#[derive(Debug, Clone)]
pub struct ImageSource {
    primary: String,
    fallback: Option<String>,
    slot: ImageSlot,
    stage: Stage,
}

impl ImageSource {
    /// URL to load right now
    pub fn current(&self) -> String {
        match self.stage {
            Stage::Primary => self.primary.clone(),
            Stage::Fallback => self
                .fallback
                .clone()
                .unwrap_or_else(|| placeholder(self.slot)),
            Stage::Placeholder => placeholder(self.slot),
        }
    }

    /// Record a load failure and return the next URL to try
    pub fn on_error(&mut self) -> String {
        self.stage = match self.stage {
            Stage::Primary if self.fallback.is_some() => Stage::Fallback,
            _ => Stage::Placeholder,
        };
        self.current()
    }

    pub fn is_placeholder(&self) -> bool {
        self.stage == Stage::Placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ImageResolver {
        ImageResolver::from_api_url("https://campus.example.com/api")
    }

    #[test]
    fn test_backend_origin_strips_api_suffix() {
        assert_eq!(backend_origin("http://localhost:8000/api"), "http://localhost:8000");
        assert_eq!(backend_origin("http://localhost:8000/api/"), "http://localhost:8000");
        assert_eq!(backend_origin("http://localhost:8000/apis"), "http://localhost:8000/apis");
    }

    #[test]
    fn test_resolve() {
        let r = resolver();
        assert_eq!(
            r.resolve("HTTPS://cdn.example.com/a.png").as_deref(),
            Some("HTTPS://cdn.example.com/a.png")
        );
        assert_eq!(
            r.resolve("post_images/a.png").as_deref(),
            Some("https://campus.example.com/post_images/a.png")
        );
        assert_eq!(
            r.resolve("/media/a.png").as_deref(),
            Some("https://campus.example.com/media/a.png")
        );
        assert_eq!(r.resolve("  "), None);
    }

    #[test]
    fn test_fallback_adds_media_prefix_once() {
        let r = resolver();
        assert_eq!(
            r.fallback("/post_images/a.png").as_deref(),
            Some("https://campus.example.com/media/post_images/a.png")
        );
        assert_eq!(
            r.fallback("/media/a.png").as_deref(),
            Some("https://campus.example.com/media/a.png")
        );
        assert_eq!(
            r.fallback("uploads/a.png").as_deref(),
            Some("https://campus.example.com/media/uploads/a.png")
        );
        assert_eq!(r.fallback("https://cdn.example.com/a.png"), None);
    }

    #[test]
    fn test_absolute_source_skips_to_placeholder() {
        let mut source = resolver()
            .source(Some("https://cdn.example.com/a.png"), ImageSlot::Thumbnail)
            .unwrap();
        source.on_error();
        assert!(source.is_placeholder());
    }

    #[test]
    fn test_source_retries_once_then_placeholder() {
        let mut source = resolver()
            .source(Some("/post_images/a.png"), ImageSlot::Card)
            .unwrap();
        assert_eq!(source.current(), "https://campus.example.com/post_images/a.png");

        assert_eq!(
            source.on_error(),
            "https://campus.example.com/media/post_images/a.png"
        );
        assert!(!source.is_placeholder());

        let last = source.on_error();
        assert!(source.is_placeholder());
        assert!(last.starts_with("data:image/svg+xml;utf8,"));

        // Further failures stay on the placeholder
        assert_eq!(source.on_error(), last);
    }

    #[test]
    fn test_no_source_without_image() {
        assert!(resolver().source(None, ImageSlot::Hero).is_none());
        assert!(resolver().source(Some(""), ImageSlot::Hero).is_none());
    }

    #[test]
    fn test_placeholder_sizes() {
        let hero = urlencoding::decode(&placeholder(ImageSlot::Hero)["data:image/svg+xml;utf8,".len()..])
            .unwrap()
            .into_owned();
        assert!(hero.contains("width='1200'"));
        assert!(hero.contains("height='500'"));
        assert!(hero.contains("No image"));

        let thumb = placeholder(ImageSlot::Thumbnail);
        assert!(thumb.contains("width%3D%27200%27"));
    }
}
