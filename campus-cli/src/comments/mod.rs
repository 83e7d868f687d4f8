//! Comment thread of a single post.
//!
//! Each node owns its replies outright; lookups are depth-first over the
//! owned tree. Nodes are only ever appended, never removed or reordered.

mod form;


use std::collections::{HashMap, HashSet};

use campus_types::{Comment, CommentId};

use crate::likes::{LikeState, LikeToggle};
use crate::storage::{KeyValueStore, StoreResult};

pub use form::{CommentForm, ValidationError};

/// Comment hierarchy plus the visitor's local like overlay and reply drafts
#[derive(Debug, Default)]
pub struct CommentTree {
    roots: Vec<Comment>,
    likes: LikeState,
    drafts: HashMap<CommentId, CommentForm>,
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole thread with a freshly fetched one.
    ///
    /// Like state is re-read from the store and every node gets a count
    /// entry; counts already known locally are kept.
    pub fn load(&mut self, comments: Vec<Comment>, store: &mut dyn KeyValueStore) {
        self.roots = nest(comments);
        self.drafts.clear();
        self.likes = LikeState::load(store);

        let ids: Vec<CommentId> = self.iter().map(|(_, c)| c.id).collect();
        let mut seeded = 0;
        for id in ids {
            if self.likes.ensure_count(id) {
                seeded += 1;
            }
        }

        if seeded > 0 {
            if let Err(e) = self.likes.persist(store) {
                log::warn!(target: "comments", "Failed to persist like counts: {}", e);
            }
        }

        log_comments!("Loaded {} comment(s), seeded {} like count(s)", self.len(), seeded);
    }

    /// Place a comment returned by the backend.
    ///
    /// Top-level records are appended to the root list, replies become the
    /// last reply of their parent. Returns false and leaves the tree alone
    /// when the parent is unknown or the id is already present. Replies
    /// carried by the record whose ids are already in the thread are pruned.
    pub fn insert(&mut self, mut created: Comment, store: &mut dyn KeyValueStore) -> bool {
        let mut seen: HashSet<CommentId> = self.iter().map(|(_, c)| c.id).collect();
        if !dedupe(&mut created, &mut seen) {
            return false;
        }

        let id = created.id;
        let placed: Vec<CommentId> = subtree(&created).map(|(_, c)| c.id).collect();
        let parent_id = created.parent_id;
        match parent_id {
            None => self.roots.push(created),
            Some(parent_id) => match find_node_mut(&mut self.roots, parent_id) {
                Some(parent) => parent.replies.push(created),
                None => {
                    log::warn!(target: "comments", "Parent {} of comment {} not found, ignoring", parent_id, id);
                    return false;
                }
            },
        }

        let mut seeded = false;
        for placed_id in placed {
            seeded |= self.likes.ensure_count(placed_id);
        }
        if seeded {
            if let Err(e) = self.likes.persist(store) {
                log::warn!(target: "comments", "Failed to persist like count for {}: {}", id, e);
            }
        }

        log_comments!("Inserted comment {}", id);
        true
    }

    /// Flip the visitor's like on a comment and persist it
    pub fn toggle_like(&mut self, id: CommentId, store: &mut dyn KeyValueStore) -> StoreResult<LikeToggle> {
        let toggle = self.likes.toggle(id, store)?;
        log_comments!("Comment {} liked={} count={}", id, toggle.liked, toggle.count);
        Ok(toggle)
    }

    pub fn is_liked(&self, id: CommentId) -> bool {
        self.likes.is_liked(id)
    }

    pub fn like_count(&self, id: CommentId) -> i64 {
        self.likes.count(id)
    }

    /// Open a reply draft for `id`, mentioning its author.
    ///
    /// An already open draft is kept as is. Returns false if the comment
    /// is not in the thread.
    pub fn open_reply_form(&mut self, id: CommentId) -> bool {
        let Some(author) = self.find(id).map(|c| c.author().to_string()) else {
            return false;
        };
        self.drafts
            .entry(id)
            .or_insert_with(|| CommentForm::reply_to(&author));
        true
    }

    /// Discard the reply draft for `id`
    pub fn close_reply_form(&mut self, id: CommentId) {
        self.drafts.remove(&id);
    }

    pub fn draft(&self, id: CommentId) -> Option<&CommentForm> {
        self.drafts.get(&id)
    }

    /// Check the reply draft for `id` before it is sent. None if no draft
    /// is open.
    pub fn validate_reply(&self, id: CommentId) -> Option<Result<(), ValidationError>> {
        let draft = self.drafts.get(&id)?;
        let author = self.find(id).map(|c| c.author()).unwrap_or_default();
        Some(draft.validate_reply(author))
    }

    pub fn draft_mut(&mut self, id: CommentId) -> Option<&mut CommentForm> {
        self.drafts.get_mut(&id)
    }

    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        self.iter().map(|(_, c)| c).find(|c| c.id == id)
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.find(id).is_some()
    }

    /// Total number of comments at every depth
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order depth-first walk yielding `(depth, comment)`
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().map(|c| (0, c)).collect(),
        }
    }
}

/// Pre-order iterator over a comment thread
pub struct Iter<'a> {
    stack: Vec<(usize, &'a Comment)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.replies.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

fn subtree(node: &Comment) -> Iter<'_> {
    Iter {
        stack: vec![(0, node)],
    }
}

fn find_node_mut(nodes: &mut [Comment], id: CommentId) -> Option<&mut Comment> {
    nodes.iter_mut().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_node_mut(&mut node.replies, id)
        }
    })
}

/// Build the thread from a fetched payload.
///
/// The backend may answer nested records, a flat list with `parent_id`
/// set, or a mix. Flat replies are moved under their parent, records
/// whose parent never shows up stay at the root, and repeated ids keep
/// their first occurrence only.
fn nest(records: Vec<Comment>) -> Vec<Comment> {
    let mut roots: Vec<Comment> = Vec::new();
    let mut seen: HashSet<CommentId> = HashSet::new();
    let mut pending = records;

    loop {
        let before = pending.len();
        let mut deferred = Vec::new();

        for mut record in pending {
            let parent_id = record.parent_id;
            let parent = match parent_id {
                Some(parent_id) if seen.contains(&parent_id) => {
                    find_node_mut(&mut roots, parent_id)
                }
                Some(_) => {
                    deferred.push(record);
                    continue;
                }
                None => None,
            };

            if !dedupe(&mut record, &mut seen) {
                continue;
            }
            match parent {
                Some(parent) => parent.replies.push(record),
                None => roots.push(record),
            }
        }

        if deferred.is_empty() {
            return roots;
        }
        if deferred.len() == before {
            // Nothing left can be placed: promote the earliest orphan so its
            // own replies still nest under it on the next pass
            let mut orphan = deferred.remove(0);
            if dedupe(&mut orphan, &mut seen) {
                log::debug!(target: "comments", "Parent of comment {} missing from payload, keeping at root", orphan.id);
                roots.push(orphan);
            }
        }
        pending = deferred;
    }
}

/// Register `node` and its subtree in `seen`, pruning repeated ids.
/// Returns false if `node` itself was already seen.
fn dedupe(node: &mut Comment, seen: &mut HashSet<CommentId>) -> bool {
    if !seen.insert(node.id) {
        log::warn!(target: "comments", "Dropping duplicate comment {}", node.id);
        return false;
    }
    node.replies.retain_mut(|child| dedupe(child, seen));
    true
}
