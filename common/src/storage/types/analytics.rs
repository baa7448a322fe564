use crate::storage::types::{post::deserialize_flexible_id, user::User, StoredObject};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, storage::db::SurrealDbClient};

#[derive(Debug, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub page_loads: i64,
    pub visitors: i64,
}

impl StoredObject for Analytics {
    fn table_name() -> &'static str {
        "analytics"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}

impl Analytics {
    pub async fn ensure_initialized(db: &SurrealDbClient) -> Result<Self, AppError> {
        let analytics = db.get_item::<Self>("current").await?;

        if analytics.is_none() {
            let created_analytics = Analytics {
                id: "current".to_string(),
                visitors: 0,
                page_loads: 0,
            };

            let stored: Option<Self> = db.store_item(created_analytics).await?;
            return stored.ok_or(AppError::Validation(
                "Failed to initialize analytics".into(),
            ));
        }

        analytics.ok_or(AppError::Validation(
            "Failed to initialize analytics".into(),
        ))
    }

    pub async fn get_current(db: &SurrealDbClient) -> Result<Self, AppError> {
        let analytics: Option<Self> = db.get_item("current").await?;
        analytics.ok_or(AppError::NotFound("Analytics not found".into()))
    }

    pub async fn increment_visitors(db: &SurrealDbClient) -> Result<Self, AppError> {
        let updated: Option<Self> = db
            .client
            .query("UPDATE type::thing('analytics', 'current') SET visitors += 1 RETURN AFTER")
            .await?
            .take(0)?;

        updated.ok_or(AppError::Validation("Failed to update analytics".into()))
    }

    pub async fn increment_page_loads(db: &SurrealDbClient) -> Result<Self, AppError> {
        let updated: Option<Self> = db
            .client
            .query("UPDATE type::thing('analytics', 'current') SET page_loads += 1 RETURN AFTER")
            .await?
            .take(0)?;

        updated.ok_or(AppError::Validation("Failed to update analytics".into()))
    }

    pub async fn get_users_amount(db: &SurrealDbClient) -> Result<i64, AppError> {
        // We need to use a direct query for COUNT aggregation
        #[derive(Debug, Deserialize)]
        struct CountResult {
            count: i64,
        }

        let result: Option<CountResult> = db
            .client
            .query("SELECT count() as count FROM type::table($table) GROUP ALL")
            .bind(("table", User::table_name()))
            .await?
            .take(0)?;

        Ok(result.map(|r| r.count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_analytics_initialization() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let analytics = Analytics::ensure_initialized(&db)
            .await
            .expect("Failed to initialize analytics");

        assert_eq!(analytics.id, "current");
        assert_eq!(analytics.page_loads, 0);
        assert_eq!(analytics.visitors, 0);

        // Idempotency - calling it again doesn't change anything
        let analytics_again = Analytics::ensure_initialized(&db)
            .await
            .expect("Failed to get analytics after initialization");

        assert_eq!(analytics.id, analytics_again.id);
        assert_eq!(analytics.page_loads, analytics_again.page_loads);
        assert_eq!(analytics.visitors, analytics_again.visitors);
    }

    #[tokio::test]
    async fn test_increment_counters() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        Analytics::ensure_initialized(&db)
            .await
            .expect("Failed to initialize analytics");

        let analytics = Analytics::increment_visitors(&db)
            .await
            .expect("Failed to increment visitors");
        assert_eq!(analytics.visitors, 1);
        assert_eq!(analytics.page_loads, 0);

        let analytics = Analytics::increment_page_loads(&db)
            .await
            .expect("Failed to increment page loads");
        assert_eq!(analytics.visitors, 1);
        assert_eq!(analytics.page_loads, 1);

        let analytics = Analytics::increment_page_loads(&db)
            .await
            .expect("Failed to increment page loads again");
        assert_eq!(analytics.page_loads, 2);
    }

    #[tokio::test]
    async fn test_get_current_nonexistent() {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb");

        let result = Analytics::get_current(&db).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
