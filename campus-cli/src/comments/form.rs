use campus_types::{CommentId, CreateCommentRequest};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your name")]
    MissingName,

    #[error("Please enter a comment")]
    MissingContent,
}

/// Fields of a comment or reply being written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    pub name: String,
    /// Optional
    pub email: String,
    pub content: String,
}

impl CommentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft for a reply to `author`, pre-filled with a mention
    pub fn reply_to(author: &str) -> Self {
        Self {
            content: mention(author),
            ..Self::default()
        }
    }

    /// Name and content are required; email is not.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        Ok(())
    }

    /// Like `validate`, but content that is only the mention of `author`
    /// counts as missing
    pub fn validate_reply(&self, author: &str) -> Result<(), ValidationError> {
        self.validate()?;
        if self.content.trim() == mention(author).trim() {
            return Err(ValidationError::MissingContent);
        }
        Ok(())
    }

    pub fn to_request(&self, parent_id: Option<CommentId>) -> CreateCommentRequest {
        CreateCommentRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            content: self.content.trim().to_string(),
            parent_id,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn mention(author: &str) -> String {
    format!("@{} ", author)
}
