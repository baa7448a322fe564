use common::storage::types::post::Post;

const EXCERPT_LENGTH: usize = 160;

fn maybe_truncate(value: &str, limit: usize) -> Option<String> {
    let mut char_count = 0;

    for (idx, _) in value.char_indices() {
        if char_count == limit {
            return Some(value[..idx].to_string());
        }

        char_count += 1;
    }

    None
}

/// Excerpt for a post: the stored excerpt when present, otherwise the leading
/// characters of the content.
pub fn derive_excerpt(excerpt: &str, content: &str) -> String {
    let trimmed = excerpt.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    match maybe_truncate(content.trim(), EXCERPT_LENGTH) {
        Some(truncated) => format!("{truncated}…"),
        None => content.trim().to_string(),
    }
}

pub fn truncate_post_listing(mut post: Post) -> Post {
    if let Some(truncated) = maybe_truncate(&post.content, EXCERPT_LENGTH) {
        post.content = truncated;
    }

    post
}

pub fn truncate_post_listings(posts: Vec<Post>) -> Vec<Post> {
    posts.into_iter().map(truncate_post_listing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_excerpt_wins() {
        assert_eq!(derive_excerpt("  An excerpt  ", "ignored"), "An excerpt");
    }

    #[test]
    fn short_content_is_kept_whole() {
        assert_eq!(derive_excerpt("", "short body"), "short body");
    }

    #[test]
    fn long_content_is_cut_on_a_char_boundary() {
        let content = "å".repeat(200);
        let derived = derive_excerpt("", &content);
        assert!(derived.chars().count() <= EXCERPT_LENGTH + 1);
        assert!(derived.ends_with('…'));
    }
}
