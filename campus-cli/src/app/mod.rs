mod blog;
mod post_detail;


use campus_types::CommentId;
use thiserror::Error;

use crate::api::ApiError;
use crate::comments::ValidationError;

pub use blog::BlogList;
pub use post_detail::PostDetail;

/// Why a comment or reply was not submitted
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No reply draft open for comment {0}")]
    NoDraft(CommentId),

    #[error("Failed to submit comment: {0}")]
    Api(#[from] ApiError),
}
