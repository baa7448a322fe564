use common::storage::types::user::DashboardStats;
use common::storage::{db::SurrealDbClient, store::StorageManager};
use common::utils::template_engine::{ProvidesTemplateEngine, TemplateEngine};
use common::{create_template_engine, storage::db::ProvidesDb, utils::config::AppConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::SessionStoreType;

#[derive(Clone)]
pub struct HtmlState {
    pub db: Arc<SurrealDbClient>,
    pub templates: Arc<TemplateEngine>,
    pub session_store: Arc<SessionStoreType>,
    pub config: AppConfig,
    pub storage: StorageManager,
    dashboard_stats_cache: Arc<RwLock<HashMap<String, StatsCacheEntry>>>,
}

#[derive(Clone)]
struct StatsCacheEntry {
    stats: DashboardStats,
    expires_at: Instant,
}

const DASHBOARD_STATS_CACHE_TTL: Duration = Duration::from_secs(30);

impl HtmlState {
    pub async fn new_with_resources(
        db: Arc<SurrealDbClient>,
        session_store: Arc<SessionStoreType>,
        storage: StorageManager,
        config: AppConfig,
        template_engine: Option<Arc<TemplateEngine>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let templates =
            template_engine.unwrap_or_else(|| Arc::new(create_template_engine!("templates")));
        debug!("Template engine configured for html_router.");

        Ok(Self {
            db,
            session_store,
            templates,
            config,
            storage,
            dashboard_stats_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Cached dashboard stats for a user, if still fresh.
    ///
    /// Stats are invalidated on every post/email mutation so the dashboard
    /// never shows stale counters for longer than a single request.
    pub async fn get_cached_dashboard_stats(&self, user_id: &str) -> Option<DashboardStats> {
        let cache = self.dashboard_stats_cache.read().await;
        let entry = cache.get(user_id)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.stats.clone())
    }

    pub async fn set_cached_dashboard_stats(&self, user_id: &str, stats: DashboardStats) {
        let mut cache = self.dashboard_stats_cache.write().await;
        cache.insert(
            user_id.to_string(),
            StatsCacheEntry {
                stats,
                expires_at: Instant::now() + DASHBOARD_STATS_CACHE_TTL,
            },
        );
    }

    pub async fn invalidate_dashboard_stats(&self, user_id: &str) {
        let mut cache = self.dashboard_stats_cache.write().await;
        cache.remove(user_id);
    }
}
impl ProvidesDb for HtmlState {
    fn db(&self) -> &Arc<SurrealDbClient> {
        &self.db
    }
}
impl ProvidesTemplateEngine for HtmlState {
    fn template_engine(&self) -> &Arc<TemplateEngine> {
        &self.templates
    }
}

impl crate::middlewares::response_middleware::ProvidesHtmlState for HtmlState {
    fn html_state(&self) -> &HtmlState {
        self
    }
}
