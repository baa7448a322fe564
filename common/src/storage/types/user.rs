use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use async_trait::async_trait;
use axum_session_auth::Authentication;
use surrealdb::{engine::any::Any, Surreal};
use uuid::Uuid;

use super::email_address::EmailAddress;
use super::post::{Post, PostStatus};
use super::system_settings::SystemSettings;
use crate::storage::store::StorageManager;
use chrono::Duration;
use futures::try_join;

/// A username may be changed again only after this many days.
pub const USERNAME_CHANGE_COOLDOWN_DAYS: i64 = 30;

stored_object!(User, "user", {
    email: String,
    password: String,
    username: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    avatar_url: Option<String>,
    anonymous: bool,
    api_key: Option<String>,
    admin: bool,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    username_changed_at: Option<DateTime<Utc>>
});

#[async_trait]
impl Authentication<User, String, Surreal<Any>> for User {
    async fn load_user(userid: String, db: Option<&Surreal<Any>>) -> Result<User, anyhow::Error> {
        let db = db.ok_or_else(|| anyhow::anyhow!("Database handle missing"))?;
        let user: Option<User> = db.select((Self::table_name(), userid.as_str())).await?;
        user.ok_or_else(|| anyhow::anyhow!("User not found"))
    }

    fn is_authenticated(&self) -> bool {
        !self.anonymous
    }

    fn is_active(&self) -> bool {
        !self.anonymous
    }

    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

fn validate_username(input: &str) -> Result<(), AppError> {
    let valid_chars = input
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if input.len() < 3 || input.len() > 32 || !valid_chars {
        return Err(AppError::Validation(
            "Usernames are 3-32 characters of lowercase letters, digits, '-' or '_'".into(),
        ));
    }

    Ok(())
}

/// Counters shown on the dashboard. Recomputed on demand, cached by the HTML layer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub trashed_posts: i64,
    pub new_posts_week: i64,
    pub total_emails: i64,
    pub unverified_emails: i64,
}

#[derive(Deserialize)]
struct CountResult {
    count: i64,
}

/// Profile fields a user may edit about themselves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
}

/// User data safe to expose to other users and API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
        }
    }
}

impl User {
    async fn count_total<T: crate::storage::types::StoredObject>(
        db: &SurrealDbClient,
        user_id: &str,
    ) -> Result<i64, AppError> {
        let result: Option<CountResult> = db
            .client
            .query("SELECT count() as count FROM type::table($table) WHERE user_id = $user_id GROUP ALL")
            .bind(("table", T::table_name()))
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0))
    }

    async fn count_posts_with_status(
        db: &SurrealDbClient,
        user_id: &str,
        status: PostStatus,
    ) -> Result<i64, AppError> {
        let result: Option<CountResult> = db
            .client
            .query(
                "SELECT count() as count FROM type::table($table) WHERE user_id = $user_id AND status = $status GROUP ALL",
            )
            .bind(("table", Post::table_name()))
            .bind(("user_id", user_id.to_string()))
            .bind(("status", status.as_str()))
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0))
    }

    async fn count_posts_since(
        db: &SurrealDbClient,
        user_id: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64, AppError> {
        let result: Option<CountResult> = db
            .client
            .query(
                "SELECT count() as count FROM type::table($table) WHERE user_id = $user_id AND created_at >= $since GROUP ALL",
            )
            .bind(("table", Post::table_name()))
            .bind(("user_id", user_id.to_string()))
            .bind(("since", surrealdb::Datetime::from(since)))
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0))
    }

    async fn count_unverified_emails(
        db: &SurrealDbClient,
        user_id: &str,
    ) -> Result<i64, AppError> {
        let result: Option<CountResult> = db
            .client
            .query(
                "SELECT count() as count FROM type::table($table) WHERE user_id = $user_id AND email_confirmed_at IS NONE GROUP ALL",
            )
            .bind(("table", EmailAddress::table_name()))
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count).unwrap_or(0))
    }

    pub async fn get_dashboard_stats(
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<DashboardStats, AppError> {
        let since = chrono::Utc::now() - Duration::days(7);

        let (
            total_posts,
            published_posts,
            draft_posts,
            trashed_posts,
            new_posts_week,
            total_emails,
            unverified_emails,
        ) = try_join!(
            Self::count_total::<Post>(db, user_id),
            Self::count_posts_with_status(db, user_id, PostStatus::Publish),
            Self::count_posts_with_status(db, user_id, PostStatus::Draft),
            Self::count_posts_with_status(db, user_id, PostStatus::Trash),
            Self::count_posts_since(db, user_id, since),
            Self::count_total::<EmailAddress>(db, user_id),
            Self::count_unverified_emails(db, user_id)
        )?;

        Ok(DashboardStats {
            total_posts,
            published_posts,
            draft_posts,
            trashed_posts,
            new_posts_week,
            total_emails,
            unverified_emails,
        })
    }

    pub async fn create_new(
        email: String,
        password: String,
        username: String,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        // verify that the application allows new creations
        let systemsettings = SystemSettings::get_current(db).await?;
        if !systemsettings.registrations_enabled {
            return Err(AppError::Auth("Registration is not allowed".into()));
        }

        validate_username(&username)?;

        if Self::find_by_username(&username, db).await?.is_some() {
            return Err(AppError::Validation("That username is taken".into()));
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let user: Option<User> = db
            .client
            .query(
                "LET $count = (SELECT count() FROM type::table($table))[0].count;
             CREATE type::thing('user', $id) SET
                email = $email,
                password = crypto::argon2::generate($password),
                username = $username,
                full_name = '',
                bio = '',
                admin = $count < 1,
                anonymous = false,
                created_at = $created_at,
                updated_at = $updated_at",
            )
            .bind(("table", "user"))
            .bind(("id", id))
            .bind(("email", email))
            .bind(("password", password))
            .bind(("username", username))
            .bind(("created_at", surrealdb::Datetime::from(now)))
            .bind(("updated_at", surrealdb::Datetime::from(now)))
            .await?
            .take(1)?;

        user.ok_or(AppError::Auth("User failed to create".into()))
    }

    pub async fn patch_password(
        email: &str,
        password: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        db.client
            .query(
                "UPDATE user
            SET password = crypto::argon2::generate($password)
            WHERE email = $email",
            )
            .bind(("email", email.to_owned()))
            .bind(("password", password.to_owned()))
            .await?;

        Ok(())
    }

    pub async fn authenticate(
        email: &str,
        password: &str,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let user: Option<User> = db
            .client
            .query(
                "SELECT * FROM user
                WHERE email = $email
                AND crypto::argon2::compare(password, $password)",
            )
            .bind(("email", email.to_owned()))
            .bind(("password", password.to_owned()))
            .await?
            .take(0)?;
        user.ok_or(AppError::Auth("User failed to authenticate".into()))
    }

    pub async fn find_by_email(
        email: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let user: Option<User> = db
            .client
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;

        Ok(user)
    }

    pub async fn find_by_username(
        username: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let user: Option<User> = db
            .client
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?
            .take(0)?;

        Ok(user)
    }

    pub async fn find_by_api_key(
        api_key: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let user: Option<User> = db
            .client
            .query("SELECT * FROM user WHERE api_key = $api_key LIMIT 1")
            .bind(("api_key", api_key.to_string()))
            .await?
            .take(0)?;

        Ok(user)
    }

    pub async fn set_api_key(id: &str, db: &SurrealDbClient) -> Result<String, AppError> {
        // Generate a secure random API key
        let api_key = format!("sk_{}", Uuid::new_v4().to_string().replace("-", ""));

        // Update the user record with the new API key
        let user: Option<User> = db
            .client
            .query(
                "UPDATE type::thing('user', $id)
                SET api_key = $api_key
                RETURN AFTER",
            )
            .bind(("id", id.to_owned()))
            .bind(("api_key", api_key.clone()))
            .await?
            .take(0)?;

        // If the user was found and updated, return the API key
        if user.is_some() {
            Ok(api_key)
        } else {
            Err(AppError::Auth("User not found".into()))
        }
    }

    pub async fn revoke_api_key(id: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        let user: Option<User> = db
            .client
            .query(
                "UPDATE type::thing('user', $id)
                SET api_key = NONE
                RETURN AFTER",
            )
            .bind(("id", id.to_owned()))
            .await?
            .take(0)?;

        if user.is_some() {
            Ok(())
        } else {
            Err(AppError::Auth("User was not found".into()))
        }
    }

    /// Apply profile changes. A username change is throttled to once per
    /// [`USERNAME_CHANGE_COOLDOWN_DAYS`] and checked for availability.
    pub async fn update_profile(
        user_id: &str,
        changes: ProfileChanges,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let current: User = db
            .get_item(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let mut username_changed = false;
        if let Some(username) = changes.username.as_deref() {
            if username != current.username {
                validate_username(username)?;

                if let Some(changed_at) = current.username_changed_at {
                    let unlocks_at = changed_at + Duration::days(USERNAME_CHANGE_COOLDOWN_DAYS);
                    let now = Utc::now();
                    if now < unlocks_at {
                        let remaining = (unlocks_at - now).num_days().max(1);
                        return Err(AppError::Forbidden(format!(
                            "You can change it after {remaining} days."
                        )));
                    }
                }

                if Self::find_by_username(username, db).await?.is_some() {
                    return Err(AppError::Validation("That username is taken".into()));
                }
                username_changed = true;
            }
        }

        let now = Utc::now();
        let updated: Option<User> = db
            .client
            .query(
                "UPDATE type::thing('user', $id) SET
                    username = $username,
                    full_name = $full_name,
                    bio = $bio,
                    username_changed_at = $username_changed_at,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("id", user_id.to_owned()))
            .bind((
                "username",
                changes.username.unwrap_or_else(|| current.username.clone()),
            ))
            .bind((
                "full_name",
                changes.full_name.unwrap_or_else(|| current.full_name.clone()),
            ))
            .bind(("bio", changes.bio.unwrap_or_else(|| current.bio.clone())))
            .bind((
                "username_changed_at",
                if username_changed {
                    Some(surrealdb::Datetime::from(now))
                } else {
                    current.username_changed_at.map(surrealdb::Datetime::from)
                },
            ))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        updated.ok_or(AppError::Validation("Profile failed to update".into()))
    }

    pub async fn update_avatar_url(
        user_id: &str,
        avatar_url: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        db.client
            .query("UPDATE type::thing('user', $id) SET avatar_url = $avatar_url")
            .bind(("id", user_id.to_owned()))
            .bind(("avatar_url", avatar_url.to_owned()))
            .await?;
        Ok(())
    }

    /// Delete everything a user owns, then the account itself. Storage objects
    /// live under a `{user_id}/` prefix so a single sweep clears them.
    pub async fn delete_account(
        user_id: &str,
        db: &SurrealDbClient,
        storage: &StorageManager,
    ) -> Result<(), AppError> {
        Post::delete_by_user(user_id, db).await?;
        EmailAddress::delete_by_user(user_id, db).await?;
        storage.delete_prefix(user_id).await?;
        db.delete_item::<User>(user_id).await?;

        Ok(())
    }

    pub async fn get_and_validate_post(
        id: &str,
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Post, AppError> {
        let post: Post = db
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

        if post.user_id != user_id {
            return Err(AppError::Auth("Access denied".into()));
        }

        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::StorageManager;
    use crate::utils::config::StorageKind;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use std::sync::Arc;

    // Helper function to set up a test database with SystemSettings
    async fn setup_test_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, &database)
            .await
            .expect("Failed to start in-memory surrealdb");

        db.ensure_initialized()
            .await
            .expect("Failed to initialize the database");

        db
    }

    #[tokio::test]
    async fn test_user_creation() {
        let db = setup_test_db().await;

        let email = "test@example.com";
        let password = "test_password";
        let username = "tester";

        let user = User::create_new(
            email.to_string(),
            password.to_string(),
            username.to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        // Verify user properties
        assert!(!user.id.is_empty());
        assert_eq!(user.email, email);
        assert_ne!(user.password, password); // Password should be hashed
        assert_eq!(user.username, username);
        assert!(!user.anonymous);
        assert!(user.admin); // First account becomes the admin

        // Verify it can be retrieved
        let retrieved: Option<User> = db
            .get_item(&user.id)
            .await
            .expect("Failed to retrieve user");
        assert!(retrieved.is_some());

        let retrieved = retrieved.expect("User should exist");
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.email, email);

        // Second account is a regular user
        let second = User::create_new(
            "second@example.com".to_string(),
            "password".to_string(),
            "second".to_string(),
            &db,
        )
        .await
        .expect("Failed to create second user");
        assert!(!second.admin);
    }

    #[tokio::test]
    async fn test_username_rules() {
        let db = setup_test_db().await;

        let too_short = User::create_new(
            "short@example.com".to_string(),
            "password".to_string(),
            "ab".to_string(),
            &db,
        )
        .await;
        assert!(matches!(too_short, Err(AppError::Validation(_))));

        let bad_chars = User::create_new(
            "caps@example.com".to_string(),
            "password".to_string(),
            "Has Spaces".to_string(),
            &db,
        )
        .await;
        assert!(matches!(bad_chars, Err(AppError::Validation(_))));

        User::create_new(
            "taken@example.com".to_string(),
            "password".to_string(),
            "taken_name".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        let duplicate = User::create_new(
            "other@example.com".to_string(),
            "password".to_string(),
            "taken_name".to_string(),
            &db,
        )
        .await;
        assert!(matches!(duplicate, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_user_authentication() {
        let db = setup_test_db().await;

        let email = "auth_test@example.com";
        let password = "auth_password";

        User::create_new(
            email.to_string(),
            password.to_string(),
            "auth_tester".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        // Test successful authentication
        let auth_result = User::authenticate(email, password, &db).await;
        assert!(auth_result.is_ok());

        // Test failed authentication with wrong password
        let wrong_auth = User::authenticate(email, "wrong_password", &db).await;
        assert!(wrong_auth.is_err());

        // Test failed authentication with non-existent user
        let nonexistent = User::authenticate("nonexistent@example.com", password, &db).await;
        assert!(nonexistent.is_err());
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let db = setup_test_db().await;

        let created = User::create_new(
            "find@example.com".to_string(),
            "password".to_string(),
            "findable".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        let found = User::find_by_username("findable", &db)
            .await
            .expect("Error searching for user");
        assert_eq!(found.map(|u| u.id), Some(created.id));

        let not_found = User::find_by_username("missing", &db)
            .await
            .expect("Error searching for user");
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_api_key_management() {
        let db = setup_test_db().await;

        let user = User::create_new(
            "apikey_test@example.com".to_string(),
            "apikey_password".to_string(),
            "apikey_user".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        // Initially, user should have no API key
        assert!(user.api_key.is_none());

        // Generate API key
        let api_key = User::set_api_key(&user.id, &db)
            .await
            .expect("Failed to set API key");
        assert!(!api_key.is_empty());
        assert!(api_key.starts_with("sk_"));

        // Test finding user by API key
        let found_user = User::find_by_api_key(&api_key, &db)
            .await
            .expect("Error searching by API key");
        assert_eq!(found_user.map(|u| u.id), Some(user.id.clone()));

        // Revoke API key
        User::revoke_api_key(&user.id, &db)
            .await
            .expect("Failed to revoke API key");

        let not_found = User::find_by_api_key(&api_key, &db)
            .await
            .expect("Error searching by API key");
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_password_update() {
        let db = setup_test_db().await;

        let email = "pwd_test@example.com";
        let old_password = "old_password";
        let new_password = "new_password";

        User::create_new(
            email.to_string(),
            old_password.to_string(),
            "pwd_user".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        // Authenticate with old password
        let auth_result = User::authenticate(email, old_password, &db).await;
        assert!(auth_result.is_ok());

        // Update password
        User::patch_password(email, new_password, &db)
            .await
            .expect("Failed to update password");

        // Old password should no longer work
        let old_auth = User::authenticate(email, old_password, &db).await;
        assert!(old_auth.is_err());

        // New password should work
        let new_auth = User::authenticate(email, new_password, &db).await;
        assert!(new_auth.is_ok());
    }

    #[tokio::test]
    async fn test_username_change_is_throttled() {
        let db = setup_test_db().await;

        let user = User::create_new(
            "throttle@example.com".to_string(),
            "password".to_string(),
            "first_name".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        // First change goes through
        let changed = User::update_profile(
            &user.id,
            ProfileChanges {
                username: Some("second_name".to_string()),
                ..ProfileChanges::default()
            },
            &db,
        )
        .await
        .expect("Failed to change username");
        assert_eq!(changed.username, "second_name");
        assert!(changed.username_changed_at.is_some());

        // A second change inside the cooldown is rejected
        let again = User::update_profile(
            &user.id,
            ProfileChanges {
                username: Some("third_name".to_string()),
                ..ProfileChanges::default()
            },
            &db,
        )
        .await;
        assert!(matches!(again, Err(AppError::Forbidden(_))));

        // Editing other fields stays possible during the cooldown
        let bio_only = User::update_profile(
            &user.id,
            ProfileChanges {
                bio: Some("A new bio".to_string()),
                ..ProfileChanges::default()
            },
            &db,
        )
        .await
        .expect("Failed to update bio");
        assert_eq!(bio_only.bio, "A new bio");
        assert_eq!(bio_only.username, "second_name");
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let db = setup_test_db().await;
        let user_id = "stats_user";

        let mut published = Post::new(
            "Published".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            user_id.to_string(),
        );
        published.status = PostStatus::Publish;
        db.store_item(published).await.expect("Failed to store");

        let draft = Post::new(
            "Draft".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            user_id.to_string(),
        );
        db.store_item(draft).await.expect("Failed to store");

        EmailAddress::add("stats@example.com".to_string(), user_id.to_string(), true, &db)
            .await
            .expect("Failed to add email");

        let stats = User::get_dashboard_stats(user_id, &db)
            .await
            .expect("Failed to get stats");

        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.published_posts, 1);
        assert_eq!(stats.draft_posts, 1);
        assert_eq!(stats.trashed_posts, 0);
        assert_eq!(stats.new_posts_week, 2);
        assert_eq!(stats.total_emails, 1);
        assert_eq!(stats.unverified_emails, 1);
    }

    #[tokio::test]
    async fn test_delete_account_removes_owned_data() {
        let db = setup_test_db().await;
        let storage = StorageManager::with_backend(Arc::new(InMemory::new()), StorageKind::Memory);

        let user = User::create_new(
            "goner@example.com".to_string(),
            "password".to_string(),
            "goner".to_string(),
            &db,
        )
        .await
        .expect("Failed to create user");

        let post = Post::new(
            "Owned".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            user.id.clone(),
        );
        db.store_item(post.clone()).await.expect("Failed to store");

        EmailAddress::add("goner@example.com".to_string(), user.id.clone(), false, &db)
            .await
            .expect("Failed to add email");

        storage
            .put(
                &format!("{}/avatar/a.png", user.id),
                Bytes::from_static(b"px"),
            )
            .await
            .expect("Failed to store avatar");

        User::delete_account(&user.id, &db, &storage)
            .await
            .expect("Failed to delete account");

        let gone: Option<User> = db.get_item(&user.id).await.expect("Failed to fetch");
        assert!(gone.is_none());

        let posts: Option<Post> = db.get_item(&post.id).await.expect("Failed to fetch post");
        assert!(posts.is_none());

        let emails = EmailAddress::list_for_user(&user.id, &db)
            .await
            .expect("Failed to list emails");
        assert!(emails.is_empty());

        let objects = storage.list(Some(&user.id)).await.expect("Failed to list");
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_get_and_validate_post_checks_ownership() {
        let db = setup_test_db().await;

        let post = Post::new(
            "Mine".to_string(),
            "Excerpt".to_string(),
            "Body".to_string(),
            "owner".to_string(),
        );
        db.store_item(post.clone()).await.expect("Failed to store");

        let ok = User::get_and_validate_post(&post.id, "owner", &db).await;
        assert!(ok.is_ok());

        let denied = User::get_and_validate_post(&post.id, "intruder", &db).await;
        assert!(matches!(denied, Err(AppError::Auth(_))));

        let missing = User::get_and_validate_post("nope", "owner", &db).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
