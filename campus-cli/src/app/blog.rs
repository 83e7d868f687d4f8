use campus_types::Post;

use crate::api::CampusApi;
use crate::render::html_to_text;

/// Blog listing; the first few posts double as the "popular" sidebar
#[derive(Debug, Clone, Default)]
pub struct BlogList {
    pub posts: Vec<Post>,
}

impl BlogList {
    pub const EXCERPT_CHARS: usize = 400;
    pub const POPULAR_COUNT: usize = 4;

    /// Fetch the listing, degrading to an empty one on error
    pub async fn load(api: &dyn CampusApi) -> Self {
        let posts = api.fetch_posts().await.unwrap_or_else(|e| {
            log::error!("Error fetching posts: {}", e);
            Vec::new()
        });
        log_debug!("Loaded {} post(s)", posts.len());
        Self { posts }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn popular(&self) -> &[Post] {
        &self.posts[..self.posts.len().min(Self::POPULAR_COUNT)]
    }

    /// Plain-text teaser of a post body, cut at `EXCERPT_CHARS` characters
    pub fn excerpt(content: &str) -> String {
        let text = html_to_text(content);
        if text.chars().count() <= Self::EXCERPT_CHARS {
            return text;
        }
        let cut: String = text.chars().take(Self::EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}
