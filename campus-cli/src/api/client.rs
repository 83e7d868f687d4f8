use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult, CampusApi};
use campus_types::*;

/// API client for communicating with the campus media backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client. `base_url` is the API root, e.g.
    /// `https://example.com/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL for a post, with the slug percent-encoded
    fn post_url(&self, slug: &str, suffix: &str) -> String {
        format!("{}/posts/{}/{}", self.base_url, urlencoding::encode(slug), suffix)
    }

    /// Helper to handle API responses
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            log_api_call!("{} error response: {}", status.as_u16(), error_text);
            Err(error_for_status(status, &error_text))
        }
    }
}

/// Map a failed response to an error, keeping the backend's message when
/// it sent one
fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    // Clean up HTML error pages (proxies, framework debug pages)
    let message = if body.contains("<html") || body.contains("<!DOCTYPE") {
        format!("Server returned {} error. Please check the server URL.", status.as_u16())
    } else if let Some(message) = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message().map(str::to_string))
    {
        message
    } else if body.trim().is_empty() {
        format!("Server returned {} error", status.as_u16())
    } else {
        body.to_string()
    };

    match status.as_u16() {
        404 => ApiError::NotFound(message),
        400 => ApiError::BadRequest(message),
        _ => ApiError::Api(message),
    }
}

#[async_trait]
impl CampusApi for ApiClient {
    async fn fetch_posts(&self) -> ApiResult<Vec<Post>> {
        let url = format!("{}/posts/", self.base_url);
        log_api_call!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let page: Page<Post> = self.handle_response(response).await?;
        Ok(page.into_items())
    }

    async fn fetch_post(&self, slug: &str) -> ApiResult<Post> {
        let url = self.post_url(slug, "");
        log_api_call!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    async fn fetch_comments(&self, slug: &str) -> ApiResult<Vec<Comment>> {
        let url = self.post_url(slug, "comments/");
        log_api_call!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let page: Page<Comment> = self.handle_response(response).await?;
        Ok(page.into_items())
    }

    async fn post_comment(&self, slug: &str, request: &CreateCommentRequest) -> ApiResult<Comment> {
        let url = self.post_url(slug, "comments/");
        log_api_call!("POST {} (parent={:?})", url, request.parent_id);
        let response = self.client.post(&url).json(request).send().await?;
        self.handle_response(response).await
    }

    async fn toggle_post_like(&self, slug: &str, visitor_id: &str) -> ApiResult<LikeResponse> {
        let url = self.post_url(slug, "like/");
        log_api_call!("POST {}", url);
        let request = LikeRequest {
            visitor_id: visitor_id.to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        self.handle_response(response).await
    }
}
