use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned comment identifier
pub type CommentId = i64;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// The backend sends `null` for blank text fields; treat it as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// HTML body
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments_count: i64,
}

impl Post {
    /// Image path to display: `image_url` wins over `image`, blanks are ignored
    pub fn image_path(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.image.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CommentRecord")]
pub struct Comment {
    pub id: CommentId,
    /// Owning comment (None for top-level comments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub content: String,
    #[serde(serialize_with = "datetime_format::serialize")]
    pub created_at: DateTime<Utc>,
    /// Child comments in arrival order
    pub replies: Vec<Comment>,
}

/// Comment as the backend sends it. The parent link has been spelled
/// `parent_id`, `parent` and `parentId`, sometimes more than one at once.
#[derive(Deserialize)]
struct CommentRecord {
    id: CommentId,
    #[serde(default)]
    parent_id: Option<CommentId>,
    #[serde(default)]
    parent: Option<CommentId>,
    #[serde(default, rename = "parentId")]
    parent_id_camel: Option<CommentId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    #[serde(deserialize_with = "datetime_format::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    replies: Vec<Comment>,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            parent_id: record.parent_id.or(record.parent).or(record.parent_id_camel),
            name: record.name.or(record.author),
            email: record.email,
            content: record.content,
            created_at: record.created_at,
            replies: record.replies,
        }
    }
}

impl Comment {
    pub fn new(id: CommentId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            name: Some(name.into()),
            email: None,
            content: content.into(),
            created_at: Utc::now(),
            replies: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Display name, falling back to "Anonymous"
    pub fn author(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => "Anonymous",
        }
    }
}

/// List endpoints answer either a bare array or a paginated envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
    Plain(Vec<T>),
}

impl<T> Page<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Page::Paginated { results, .. } => results,
            Page::Plain(items) => items,
        }
    }
}

// Request/Response types for API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub name: String,
    pub email: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeRequest {
    pub visitor_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub likes_count: Option<i64>,
    #[serde(default)]
    pub liked: Option<bool>,
}

/// Error body returned by the backend (`detail` for framework errors)
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> Option<&str> {
        self.detail.as_deref().or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_accepts_parent_aliases() {
        let flat: Comment = serde_json::from_str(
            r#"{"id": 2, "parent": 1, "name": "Ada", "content": "hi", "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(flat.parent_id, Some(1));

        let camel: Comment = serde_json::from_str(
            r#"{"id": 3, "parentId": 2, "author": "Bo", "content": "yo", "created_at": "2024-05-01T10:00:00+01:00"}"#,
        )
        .unwrap();
        assert_eq!(camel.parent_id, Some(2));
        assert_eq!(camel.author(), "Bo");
        assert!(camel.replies.is_empty());
    }

    #[test]
    fn test_comment_with_several_parent_spellings_decodes() {
        let c: Comment = serde_json::from_str(
            r#"{"id": 4, "parent": 2, "parent_id": 2, "name": "Cy", "author": "Cy",
                "content": "both", "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(c.parent_id, Some(2));
        assert_eq!(c.author(), "Cy");

        let null_first: Comment = serde_json::from_str(
            r#"{"id": 5, "parent_id": null, "parent": 3, "content": "x", "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(null_first.parent_id, Some(3));
    }

    #[test]
    fn test_comment_serializes_back_to_snake_case() {
        let c = Comment::new(7, "Ada", "hi").with_parent(1);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["parent_id"], 1);
        let back: Comment = serde_json::from_value(json).unwrap();
        assert_eq!(back.parent_id, Some(1));
        assert_eq!(back.created_at.timestamp(), c.created_at.timestamp());
    }

    #[test]
    fn test_nested_replies_decode() {
        let c: Comment = serde_json::from_str(
            r#"{"id": 1, "name": null, "content": "root", "created_at": "2024-05-01T10:00:00.123456Z",
                "replies": [{"id": 2, "parent_id": 1, "name": "x", "content": "child", "created_at": "2024-05-01T11:00:00Z", "replies": null}]}"#,
        )
        .unwrap();
        assert_eq!(c.author(), "Anonymous");
        assert_eq!(c.replies.len(), 1);
        assert_eq!(c.replies[0].parent_id, Some(1));
    }

    #[test]
    fn test_page_accepts_both_shapes() {
        let plain: Page<i32> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(plain.into_items(), vec![1, 2, 3]);

        let paged: Page<i32> =
            serde_json::from_str(r#"{"count": 2, "next": null, "results": [4, 5]}"#).unwrap();
        assert_eq!(paged.into_items(), vec![4, 5]);
    }

    #[test]
    fn test_post_image_path_prefers_image_url() {
        let mut post: Post = serde_json::from_str(
            r#"{"id": 1, "slug": "s", "title": "t", "content": null, "image": "/post_images/a.jpg",
                "image_url": "", "created_at": "2024-05-01T10:00:00Z", "likes_count": 3}"#,
        )
        .unwrap();
        assert_eq!(post.content, "");
        assert_eq!(post.comments_count, 0);
        assert_eq!(post.image_path(), Some("/post_images/a.jpg"));

        post.image_url = Some("https://cdn.example.com/b.jpg".to_string());
        assert_eq!(post.image_path(), Some("https://cdn.example.com/b.jpg"));
    }

    #[test]
    fn test_create_request_omits_missing_parent() {
        let req = CreateCommentRequest {
            name: "Ada".to_string(),
            email: String::new(),
            content: "hello".to_string(),
            parent_id: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("parent_id").is_none());
    }
}
