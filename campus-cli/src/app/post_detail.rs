use campus_types::{CommentId, Post};

use super::SubmitError;
use crate::api::CampusApi;
use crate::comments::{CommentForm, CommentTree};
use crate::likes::LikeToggle;
use crate::storage::{KeyValueStore, StoreResult};

/// State of the post detail view: the post, its comment thread, the
/// top-level comment form and the post's like counter
pub struct PostDetail {
    pub slug: String,
    pub post: Option<Post>,
    pub tree: CommentTree,
    pub form: CommentForm,
    pub likes_count: i64,
    pub is_liked: bool,
    pub loading: bool,
    store: Box<dyn KeyValueStore>,
}

impl PostDetail {
    pub fn new(slug: impl Into<String>, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            slug: slug.into(),
            post: None,
            tree: CommentTree::new(),
            form: CommentForm::new(),
            likes_count: 0,
            is_liked: false,
            loading: false,
            store,
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Fetch the post and its comments.
    ///
    /// The two requests run together and fail independently: a missing
    /// post leaves `post` empty, failed comments leave an empty thread.
    pub async fn load(&mut self, api: &dyn CampusApi) {
        self.loading = true;
        let (post, comments) = tokio::join!(api.fetch_post(&self.slug), api.fetch_comments(&self.slug));

        match post {
            Ok(post) => {
                self.likes_count = post.likes_count;
                self.post = Some(post);
            }
            Err(e) => {
                log::error!("Fetch post error for '{}': {}", self.slug, e);
                self.post = None;
            }
        }

        let comments = comments.unwrap_or_else(|e| {
            log::error!("Fetch comments error for '{}': {}", self.slug, e);
            Vec::new()
        });
        self.tree.load(comments, self.store.as_mut());
        self.loading = false;
    }

    /// Submit the top-level comment form.
    ///
    /// Nothing is sent when validation fails. On success the created
    /// comment joins the thread and the form is reset; on failure the form
    /// is kept so it can be resubmitted.
    pub async fn submit_comment(&mut self, api: &dyn CampusApi) -> Result<CommentId, SubmitError> {
        self.form.validate()?;

        let request = self.form.to_request(None);
        let created = api.post_comment(&self.slug, &request).await.map_err(|e| {
            log::error!("Failed to submit comment on '{}': {}", self.slug, e);
            e
        })?;

        let id = created.id;
        self.tree.insert(created, self.store.as_mut());
        self.form.clear();
        Ok(id)
    }

    /// Submit the reply draft open under `parent_id`.
    ///
    /// Same rules as `submit_comment`, and a draft holding only the
    /// pre-filled mention is rejected as empty. A successful reply closes
    /// the draft.
    pub async fn submit_reply(&mut self, api: &dyn CampusApi, parent_id: CommentId) -> Result<CommentId, SubmitError> {
        match self.tree.validate_reply(parent_id) {
            Some(checked) => checked?,
            None => return Err(SubmitError::NoDraft(parent_id)),
        }
        let request = match self.tree.draft(parent_id) {
            Some(draft) => draft.to_request(Some(parent_id)),
            None => return Err(SubmitError::NoDraft(parent_id)),
        };
        let mut created = api.post_comment(&self.slug, &request).await.map_err(|e| {
            log::error!("Failed to submit reply to {} on '{}': {}", parent_id, self.slug, e);
            e
        })?;

        // Some backends do not echo the parent back
        created.parent_id.get_or_insert(parent_id);

        let id = created.id;
        self.tree.insert(created, self.store.as_mut());
        self.tree.close_reply_form(parent_id);
        Ok(id)
    }

    pub fn open_reply_form(&mut self, id: CommentId) -> bool {
        self.tree.open_reply_form(id)
    }

    pub fn close_reply_form(&mut self, id: CommentId) {
        self.tree.close_reply_form(id)
    }

    pub fn toggle_comment_like(&mut self, id: CommentId) -> StoreResult<LikeToggle> {
        self.tree.toggle_like(id, self.store.as_mut())
    }

    /// Like or unlike the post on the backend.
    ///
    /// Local state only changes when the response carries a like count.
    /// Returns whether it changed.
    pub async fn toggle_post_like(&mut self, api: &dyn CampusApi, visitor_id: &str) -> bool {
        match api.toggle_post_like(&self.slug, visitor_id).await {
            Ok(response) => match response.likes_count {
                Some(count) => {
                    self.likes_count = count;
                    self.is_liked = response.liked.unwrap_or(!self.is_liked);
                    true
                }
                None => {
                    log::warn!("Like response for '{}' carried no count", self.slug);
                    false
                }
            },
            Err(e) => {
                log::error!("Failed to like '{}': {}", self.slug, e);
                false
            }
        }
    }

    /// Number of comments at every depth
    pub fn comment_total(&self) -> usize {
        self.tree.len()
    }
}
