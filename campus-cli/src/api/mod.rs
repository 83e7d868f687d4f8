mod client;
mod error;

use async_trait::async_trait;
use campus_types::{Comment, CreateCommentRequest, LikeResponse, Post};

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};

/// Backend operations the client relies on
#[async_trait]
pub trait CampusApi: Send + Sync {
    /// `GET /posts/`
    async fn fetch_posts(&self) -> ApiResult<Vec<Post>>;

    /// `GET /posts/{slug}/`
    async fn fetch_post(&self, slug: &str) -> ApiResult<Post>;

    /// `GET /posts/{slug}/comments/`
    async fn fetch_comments(&self, slug: &str) -> ApiResult<Vec<Comment>>;

    /// `POST /posts/{slug}/comments/`, returns the created record
    async fn post_comment(&self, slug: &str, request: &CreateCommentRequest) -> ApiResult<Comment>;

    /// `POST /posts/{slug}/like/`
    async fn toggle_post_like(&self, slug: &str, visitor_id: &str) -> ApiResult<LikeResponse>;
}
