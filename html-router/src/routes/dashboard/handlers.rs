use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    html_state::HtmlState,
    middlewares::{
        auth_middleware::RequireUser,
        response_middleware::{HtmlError, TemplateResponse},
    },
    utils::post_preview::truncate_post_listings,
};
use common::storage::types::{
    post::{Post, PostFilter},
    user::{DashboardStats, User},
};

const RECENT_POSTS: usize = 5;

#[derive(Serialize)]
pub struct DashboardPageData {
    user: User,
    stats: DashboardStats,
    recent_posts: Vec<Post>,
}

/// Stats come from the per-user cache when fresh; every post/email mutation
/// drops the cached entry so the numbers here track writes immediately.
async fn load_stats(state: &HtmlState, user_id: &str) -> Result<DashboardStats, HtmlError> {
    if let Some(cached) = state.get_cached_dashboard_stats(user_id).await {
        return Ok(cached);
    }

    let stats = User::get_dashboard_stats(user_id, &state.db).await?;
    state.set_cached_dashboard_stats(user_id, stats.clone()).await;
    Ok(stats)
}

pub async fn show_dashboard(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, HtmlError> {
    let stats = load_stats(&state, &user.id).await?;

    let (recent_posts, _total) =
        Post::list_page(&user.id, &PostFilter::default(), RECENT_POSTS, 0, &state.db).await?;

    Ok(TemplateResponse::new_template(
        "dashboard/base.html",
        DashboardPageData {
            user: user.clone(),
            stats,
            recent_posts: truncate_post_listings(recent_posts),
        },
    ))
}

#[derive(Serialize)]
pub struct StatsData {
    stats: DashboardStats,
}

pub async fn show_stats(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, HtmlError> {
    let stats = load_stats(&state, &user.id).await?;

    Ok(TemplateResponse::new_partial(
        "dashboard/base.html",
        "stats_section",
        StatsData { stats },
    ))
}
