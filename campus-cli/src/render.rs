//! Plain-text rendering of posts and comment threads for the terminal.

use once_cell::sync::Lazy;
use regex::Regex;

use campus_types::Post;

use crate::app::{BlogList, PostDetail};
use crate::comments::CommentTree;
use crate::images::{ImageResolver, ImageSlot};

// Layout constants
pub const WRAP_WIDTH: usize = 80;
pub const INDENT: &str = "    ";

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Failed to compile HTML tag regex"));

static BLOCK_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|blockquote)>")
        .expect("Failed to compile block tag regex")
});

/// Format timestamp for display
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

/// Reduce post HTML to readable text: block ends become line breaks,
/// remaining tags are dropped and common entities decoded
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_END.replace_all(html, "\n");
    let stripped = HTML_TAG.replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text to `width`, prefixing every line with `indent`
pub fn wrap_indented(text: &str, indent: &str, width: usize) -> Vec<String> {
    let wrap_width = width.saturating_sub(indent.len()).max(20);
    let mut lines = vec![];

    for line in text.lines() {
        for wrapped in textwrap::wrap(line, wrap_width) {
            lines.push(format!("{}{}", indent, wrapped));
        }
    }

    if lines.is_empty() {
        lines.push(indent.to_string());
    }
    lines
}

/// One block per post: title, date, counts, excerpt and link slug
pub fn render_blog_list(list: &BlogList, images: &ImageResolver) -> Vec<String> {
    if list.posts.is_empty() {
        return vec!["No posts yet.".to_string()];
    }

    let mut lines = vec![];
    for post in &list.posts {
        lines.push(post.title.clone());
        if let Some(subtitle) = post.subtitle.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("  {}", subtitle));
        }
        lines.push(format!(
            "  {}  ♥ {}  💬 {}  [{}]",
            format_timestamp(&post.created_at),
            post.likes_count,
            post.comments_count,
            post.slug
        ));
        if let Some(image) = images.source(post.image_path(), ImageSlot::Card) {
            lines.push(format!("  image: {}", image.current()));
        }
        lines.extend(wrap_indented(&BlogList::excerpt(&post.content), "  ", WRAP_WIDTH));
        lines.push(String::new());
    }

    let popular = list.popular();
    if !popular.is_empty() {
        lines.push("Popular now".to_string());
        for post in popular {
            lines.push(format!("  - {} [{}]", post.title, post.slug));
        }
    }
    lines
}

/// Full post view with its comment thread
pub fn render_post_detail(detail: &PostDetail, images: &ImageResolver) -> Vec<String> {
    let Some(post) = detail.post.as_ref() else {
        return vec!["Post not found.".to_string()];
    };

    let mut lines = render_post_header(post, images);
    lines.push(format!(
        "{} {} likes · {} comments",
        if detail.is_liked { "♥" } else { "♡" },
        detail.likes_count,
        detail.comment_total()
    ));
    lines.push(String::new());
    lines.push(format!("Comments ({})", detail.comment_total()));
    lines.extend(render_thread(&detail.tree));
    lines
}

fn render_post_header(post: &Post, images: &ImageResolver) -> Vec<String> {
    let mut lines = vec![post.title.clone()];
    if let Some(subtitle) = post.subtitle.as_deref().filter(|s| !s.is_empty()) {
        lines.push(subtitle.to_string());
    }
    lines.push(format_timestamp(&post.created_at));
    if let Some(image) = images.source(post.image_path(), ImageSlot::Hero) {
        lines.push(format!("image: {}", image.current()));
    }
    lines.push(String::new());
    lines.extend(wrap_indented(&html_to_text(&post.content), "", WRAP_WIDTH));
    lines.push(String::new());
    lines
}

/// Indented comment tree, one header line per comment followed by its
/// wrapped content
pub fn render_thread(tree: &CommentTree) -> Vec<String> {
    if tree.is_empty() {
        return vec!["No comments yet.".to_string()];
    }

    let mut lines = vec![];
    for (depth, comment) in tree.iter() {
        let indent = INDENT.repeat(depth);
        lines.push(format!(
            "{}#{} {} · {} · {} {}",
            indent,
            comment.id,
            comment.author(),
            format_timestamp(&comment.created_at),
            if tree.is_liked(comment.id) { "♥" } else { "♡" },
            tree.like_count(comment.id)
        ));
        lines.extend(wrap_indented(&comment.content, &format!("{}  ", indent), WRAP_WIDTH));
    }
    lines
}
