use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(EmailAddress, "email_address", {
    email: String,
    user_id: String,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    confirmation_token: Option<String>
});

impl EmailAddress {
    pub fn new(email: String, user_id: String, confirmed: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            email,
            user_id,
            email_confirmed_at: confirmed.then_some(now),
            confirmation_token: (!confirmed).then(new_confirmation_token),
        }
    }

    pub async fn list_for_user(
        user_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let addresses: Vec<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE user_id = $user_id ORDER BY created_at ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()))
            .await?
            .take(0)?;

        Ok(addresses)
    }

    pub async fn find(
        user_id: &str,
        email: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let address: Option<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE user_id = $user_id AND email = $email LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("user_id", user_id.to_owned()))
            .bind(("email", email.to_owned()))
            .await?
            .take(0)?;

        Ok(address)
    }

    /// Register an address for a user. Each user can hold an address only once.
    pub async fn add(
        email: String,
        user_id: String,
        require_verification: bool,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        if Self::find(&user_id, &email, db).await?.is_some() {
            return Err(AppError::Validation(
                "That address is already registered".into(),
            ));
        }

        let address = Self::new(email, user_id, !require_verification);
        if let Some(token) = &address.confirmation_token {
            // Delivery belongs to the mail provider; we only hand the token over.
            tracing::info!(
                email = %address.email,
                token = %token,
                "Verification mail handed to provider"
            );
        }

        let stored = db.store_item(address).await?;
        stored.ok_or(AppError::Validation("Email address failed to store".into()))
    }

    /// Remove an address. The caller is responsible for keeping the primary
    /// address (`user.email`) out of reach.
    pub async fn remove(user_id: &str, email: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        let existing = Self::find(user_id, email, db)
            .await?
            .ok_or_else(|| AppError::NotFound("Email address not found".into()))?;

        db.delete_item::<Self>(&existing.id).await?;
        Ok(())
    }

    pub async fn confirm_by_token(token: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        let now = Utc::now();
        let confirmed: Option<Self> = db
            .client
            .query(
                "UPDATE type::table($table) SET
                    email_confirmed_at = $now,
                    confirmation_token = NONE,
                    updated_at = $now
                WHERE confirmation_token = $conf_token
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("conf_token", token.to_owned()))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        confirmed.ok_or(AppError::NotFound("Unknown confirmation token".into()))
    }

    /// Issue a fresh confirmation token for an unverified address.
    pub async fn reissue_token(
        user_id: &str,
        email: &str,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        let existing = Self::find(user_id, email, db)
            .await?
            .ok_or_else(|| AppError::NotFound("Email address not found".into()))?;

        if existing.email_confirmed_at.is_some() {
            return Err(AppError::Validation(
                "That address is already verified".into(),
            ));
        }

        let now = Utc::now();
        let token = new_confirmation_token();
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) SET
                    confirmation_token = $conf_token,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", existing.id))
            .bind(("conf_token", token.clone()))
            .bind(("now", surrealdb::Datetime::from(now)))
            .await?
            .take(0)?;

        tracing::info!(email = %email, token = %token, "Verification mail handed to provider");

        updated.ok_or(AppError::Validation("Email address failed to update".into()))
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

fn new_confirmation_token() -> String {
    Uuid::new_v4().simple().to_string()
}
