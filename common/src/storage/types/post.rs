use surrealdb::opt::PatchOp;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

/// Publication state of a post. Trashed posts keep their content and can be
/// restored until they are deleted permanently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Publish,
    Trash,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
            Self::Trash => "trash",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "publish" => Ok(Self::Publish),
            "trash" => Ok(Self::Trash),
            _ => Err(()),
        }
    }
}

stored_object!(Post, "post", {
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    status: PostStatus,
    user_id: String,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    published_at: Option<DateTime<Utc>>,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    deleted_at: Option<DateTime<Utc>>
});

/// Filter for paged post listings. `status` and `terms` narrow the result set,
/// `order_by`/`order` are validated against a whitelist before they reach the query.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub terms: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Publish),
            ..Self::default()
        }
    }

    /// ORDER BY clause from whitelisted inputs. Field names cannot be bound as
    /// query parameters, so anything outside the whitelist falls back to the
    /// default ordering.
    fn order_clause(&self) -> String {
        let field = match self.order_by.as_deref() {
            Some("title") => "title",
            Some("published_at") => "published_at",
            _ => "created_at",
        };
        let direction = match self.order.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        };
        format!("{field} {direction}")
    }
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: i64,
}

impl Post {
    pub fn new(title: String, excerpt: String, content: String, user_id: String) -> Self {
        let now = Utc::now();
        let slug = slugify(&title);
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            title,
            slug,
            excerpt,
            content,
            status: PostStatus::Draft,
            user_id,
            published_at: None,
            deleted_at: None,
        }
    }

    /// One page of posts for a user plus the total count matching the filter.
    pub async fn list_page(
        user_id: &str,
        filter: &PostFilter,
        limit: usize,
        start: usize,
        db: &SurrealDbClient,
    ) -> Result<(Vec<Self>, usize), AppError> {
        let mut sql = String::from("SELECT * FROM type::table($table) WHERE user_id = $user_id");
        if filter.status.is_some() {
            sql.push_str(" AND status = $status");
        }
        if filter.terms.is_some() {
            sql.push_str(
                " AND (string::contains(string::lowercase(title), string::lowercase($terms)) \
                 OR string::contains(string::lowercase(excerpt), string::lowercase($terms)))",
            );
        }
        let order_clause = filter.order_clause();
        sql.push_str(&format!(" ORDER BY {order_clause} LIMIT $limit START $start"));

        let mut query = db
            .client
            .query(sql)
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()))
            .bind(("limit", limit))
            .bind(("start", start));
        if let Some(status) = filter.status {
            query = query.bind(("status", status.as_str()));
        }
        if let Some(terms) = filter.terms.clone() {
            query = query.bind(("terms", terms));
        }

        let posts: Vec<Self> = query.await?.take(0)?;
        let total = Self::count(user_id, filter, db).await?;

        Ok((posts, total))
    }

    /// Count of a user's posts matching the filter.
    pub async fn count(
        user_id: &str,
        filter: &PostFilter,
        db: &SurrealDbClient,
    ) -> Result<usize, AppError> {
        let mut sql = String::from(
            "SELECT count() as count FROM type::table($table) WHERE user_id = $user_id",
        );
        if filter.status.is_some() {
            sql.push_str(" AND status = $status");
        }
        if filter.terms.is_some() {
            sql.push_str(
                " AND (string::contains(string::lowercase(title), string::lowercase($terms)) \
                 OR string::contains(string::lowercase(excerpt), string::lowercase($terms)))",
            );
        }
        sql.push_str(" GROUP ALL");

        let mut query = db
            .client
            .query(sql)
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()));
        if let Some(status) = filter.status {
            query = query.bind(("status", status.as_str()));
        }
        if let Some(terms) = filter.terms.clone() {
            query = query.bind(("terms", terms));
        }

        let result: Option<CountResult> = query.await?.take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0).max(0) as usize)
    }

    pub async fn get_by_slug(
        user_id: &str,
        slug: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let post: Option<Self> = db
            .client
            .query("SELECT * FROM type::table($table) WHERE user_id = $user_id AND slug = $slug LIMIT 1")
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()))
            .bind(("slug", slug.to_owned()))
            .await?
            .take(0)?;

        Ok(post)
    }

    pub async fn patch(
        id: &str,
        title: &str,
        excerpt: &str,
        content: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        let now = Utc::now();

        let _res: Option<Self> = db
            .update((Self::table_name(), id))
            .patch(PatchOp::replace("/title", title))
            .patch(PatchOp::replace("/excerpt", excerpt))
            .patch(PatchOp::replace("/content", content))
            .patch(PatchOp::replace(
                "/updated_at",
                surrealdb::Datetime::from(now),
            ))
            .await?;

        Ok(())
    }

    /// Publish a post. `published_at` is stamped on the first transition only.
    pub async fn publish(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        let now = Utc::now();
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) SET
                    status = 'publish',
                    deleted_at = NONE,
                    published_at = published_at ?? $now,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", id.to_owned()))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        updated.ok_or(AppError::NotFound("Post not found".into()))
    }

    /// Move a post to the trash. The row is kept so it can be restored.
    pub async fn trash(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        let now = Utc::now();
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) SET
                    status = 'trash',
                    deleted_at = $now,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", id.to_owned()))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        updated.ok_or(AppError::NotFound("Post not found".into()))
    }

    /// Bring a trashed post back as a draft.
    pub async fn restore(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        let now = Utc::now();
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) SET
                    status = 'draft',
                    deleted_at = NONE,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", id.to_owned()))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        updated.ok_or(AppError::NotFound("Post not found".into()))
    }

    pub async fn delete_by_user(user_id: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        db.client
            .query("DELETE FROM type::table($table) WHERE user_id = $user_id")
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()))
            .await?;

        Ok(())
    }
}

/// URL-safe slug from a title, with a short random suffix so two posts with the
/// same title never collide.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut previous_dash = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            previous_dash = false;
        } else if !previous_dash {
            slug.push('-');
            previous_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = suffix.get(..8).unwrap_or("00000000");

    if slug.is_empty() {
        format!("post-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_normalizes_titles() {
        let slug = slugify("Hello, World!  Again");
        let (body, suffix) = slug.rsplit_once('-').expect("Slug should have a suffix");
        assert_eq!(body, "hello-world-again");
        assert_eq!(suffix.len(), 8);

        let empty = slugify("!!!");
        assert!(empty.starts_with("post-"));
    }

    #[test]
    fn test_new_post_starts_as_draft() {
        let post = Post::new(
            "A title".to_string(),
            "An excerpt".to_string(),
            "Content body".to_string(),
            "user123".to_string(),
        );

        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
        assert!(post.deleted_at.is_none());
        assert!(!post.id.is_empty());
        assert!(post.slug.starts_with("a-title-"));
    }

    #[tokio::test]
    async fn test_publish_trash_restore_lifecycle() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let post = Post::new(
            "Lifecycle".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            "user123".to_string(),
        );
        db.store_item(post.clone()).await.expect("Failed to store");

        let published = Post::publish(&post.id, &db).await.expect("Failed to publish");
        assert_eq!(published.status, PostStatus::Publish);
        let first_published_at = published.published_at.expect("Should be stamped");

        let trashed = Post::trash(&post.id, &db).await.expect("Failed to trash");
        assert_eq!(trashed.status, PostStatus::Trash);
        assert!(trashed.deleted_at.is_some());

        let restored = Post::restore(&post.id, &db).await.expect("Failed to restore");
        assert_eq!(restored.status, PostStatus::Draft);
        assert!(restored.deleted_at.is_none());

        // Re-publishing keeps the original timestamp
        let republished = Post::publish(&post.id, &db)
            .await
            .expect("Failed to re-publish");
        assert_eq!(republished.published_at, Some(first_published_at));
    }

    #[tokio::test]
    async fn test_list_page_slices_and_counts() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let user_id = "pager";
        let base_time = Utc::now() - chrono::Duration::minutes(60);

        for i in 0..25 {
            let mut post = Post::new(
                format!("Post {i}"),
                format!("Excerpt {i}"),
                "Body".to_string(),
                user_id.to_string(),
            );
            post.created_at = base_time + chrono::Duration::minutes(i);
            post.updated_at = post.created_at;
            db.store_item(post).await.expect("Failed to store post");
        }

        let filter = PostFilter::default();
        let (page, total) = Post::list_page(user_id, &filter, 10, 0, &db)
            .await
            .expect("Failed to list first page");
        assert_eq!(total, 25);
        assert_eq!(page.len(), 10);
        // Default ordering is newest first
        assert_eq!(page[0].title, "Post 24");

        let (last_page, _) = Post::list_page(user_id, &filter, 10, 20, &db)
            .await
            .expect("Failed to list last page");
        assert_eq!(last_page.len(), 5);

        let (beyond, _) = Post::list_page(user_id, &filter, 10, 100, &db)
            .await
            .expect("Failed to list beyond the end");
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_list_page_filters_by_status_and_terms() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let user_id = "filterer";

        let mut published = Post::new(
            "Shipping news".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            user_id.to_string(),
        );
        published.status = PostStatus::Publish;
        db.store_item(published).await.expect("Failed to store");

        let draft = Post::new(
            "Drafted thoughts".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            user_id.to_string(),
        );
        db.store_item(draft).await.expect("Failed to store");

        let (published_only, total) = Post::list_page(user_id, &PostFilter::published(), 10, 0, &db)
            .await
            .expect("Failed to list published");
        assert_eq!(total, 1);
        assert_eq!(published_only.len(), 1);
        assert_eq!(published_only[0].title, "Shipping news");

        let search = PostFilter {
            terms: Some("drafted".to_string()),
            ..PostFilter::default()
        };
        let (found, found_total) = Post::list_page(user_id, &search, 10, 0, &db)
            .await
            .expect("Failed to search");
        assert_eq!(found_total, 1);
        assert_eq!(found[0].title, "Drafted thoughts");
    }

    #[tokio::test]
    async fn test_order_whitelist_rejects_unknown_fields() {
        let filter = PostFilter {
            order_by: Some("; DROP TABLE user".to_string()),
            order: Some("sideways".to_string()),
            ..PostFilter::default()
        };
        assert_eq!(filter.order_clause(), "created_at DESC");

        let by_title = PostFilter {
            order_by: Some("title".to_string()),
            order: Some("asc".to_string()),
            ..PostFilter::default()
        };
        assert_eq!(by_title.order_clause(), "title ASC");
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let post = Post::new(
            "Sluggable".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            "user123".to_string(),
        );
        db.store_item(post.clone()).await.expect("Failed to store");

        let found = Post::get_by_slug("user123", &post.slug, &db)
            .await
            .expect("Failed to query by slug");
        assert_eq!(found.map(|p| p.id), Some(post.id.clone()));

        let missing = Post::get_by_slug("user123", "not-a-slug", &db)
            .await
            .expect("Failed to query missing slug");
        assert!(missing.is_none());
    }
}
