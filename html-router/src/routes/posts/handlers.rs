use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Form,
};
use axum_htmx::{HxBoosted, HxRequest};
use serde::{Deserialize, Serialize};

use common::storage::types::{
    post::{Post, PostFilter, PostStatus},
    user::User,
};

use crate::{
    html_state::HtmlState,
    middlewares::{
        auth_middleware::RequireUser,
        response_middleware::{HtmlError, TemplateResponse},
    },
    utils::paging::{PagingQuery, PagingState},
    utils::post_preview::derive_excerpt,
};
use url::form_urlencoded;

#[derive(Serialize)]
pub struct PostsPageData {
    posts: Vec<Post>,
    paging: PagingState,
    status_filter: Option<String>,
    page_query: String,
}

#[derive(Deserialize)]
pub struct StatusParams {
    status: Option<String>,
}

impl StatusParams {
    /// Unknown status values fall back to "no filter" rather than erroring.
    fn parse(&self) -> Option<PostStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

async fn build_posts_page(
    state: &HtmlState,
    user: &User,
    query: &PagingQuery,
    status: Option<PostStatus>,
) -> Result<PostsPageData, HtmlError> {
    let filter = PostFilter {
        status,
        terms: query.terms(),
        order_by: query.order_by.clone(),
        order: query.order.clone(),
    };

    let offset = (query.page() - 1) * query.per_page();
    let (posts, total) =
        Post::list_page(&user.id, &filter, query.per_page(), offset, &state.db).await?;

    let paging = PagingState::from_query(query, total);

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(status) = status {
        serializer.append_pair("status", status.as_str());
    }
    if let Some(terms) = query.terms() {
        serializer.append_pair("q", &terms);
    }
    let tail = serializer.finish();
    let page_query = if tail.is_empty() {
        String::new()
    } else {
        format!("&{tail}")
    };

    Ok(PostsPageData {
        posts,
        paging,
        status_filter: status.map(|s| s.as_str().to_string()),
        page_query,
    })
}

pub async fn show_posts_page(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Query(query): Query<PagingQuery>,
    Query(status): Query<StatusParams>,
    HxRequest(is_htmx): HxRequest,
    HxBoosted(is_boosted): HxBoosted,
) -> Result<impl IntoResponse, HtmlError> {
    let data = build_posts_page(&state, &user, &query, status.parse()).await?;

    if is_htmx && !is_boosted {
        Ok(TemplateResponse::new_partial(
            "posts/base.html",
            "main",
            data,
        ))
    } else {
        Ok(TemplateResponse::new_template("posts/base.html", data))
    }
}

pub async fn show_post_form(
    RequireUser(_user): RequireUser,
) -> Result<impl IntoResponse, HtmlError> {
    Ok(TemplateResponse::new_template("posts/form.html", ()))
}

#[derive(Deserialize)]
pub struct PostParams {
    title: String,
    excerpt: String,
    content: String,
}

pub async fn create_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Form(form): Form<PostParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Ok(TemplateResponse::bad_request("A post needs a title").into_response());
    }

    let excerpt = derive_excerpt(&form.excerpt, &form.content);
    let post = Post::new(title.to_string(), excerpt, form.content, user.id.clone());
    state.db.store_item(post).await?;

    // Cached dashboard counters are stale now
    state.invalidate_dashboard_stats(&user.id).await;

    Ok(TemplateResponse::redirect("/posts").into_response())
}

#[derive(Serialize)]
pub struct PostEditData {
    post: Post,
}

pub async fn show_post_edit_form(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    let post = User::get_and_validate_post(&id, &user.id, &state.db).await?;

    Ok(TemplateResponse::new_template(
        "posts/form.html",
        PostEditData { post },
    ))
}

pub async fn patch_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Form(form): Form<PostParams>,
) -> Result<impl IntoResponse, HtmlError> {
    User::get_and_validate_post(&id, &user.id, &state.db).await?;

    let excerpt = derive_excerpt(&form.excerpt, &form.content);
    Post::patch(&id, form.title.trim(), &excerpt, &form.content, &state.db).await?;

    state.invalidate_dashboard_stats(&user.id).await;

    Ok(TemplateResponse::redirect("/posts"))
}

/// Shared tail for the status mutations: refresh the list partial after the
/// write and drop the stale stats cache.
async fn refreshed_post_list(
    state: &HtmlState,
    user: &User,
) -> Result<TemplateResponse, HtmlError> {
    state.invalidate_dashboard_stats(&user.id).await;

    let data = build_posts_page(state, user, &PagingQuery::default(), None).await?;

    Ok(TemplateResponse::new_partial(
        "posts/base.html",
        "post_list",
        data,
    ))
}

pub async fn publish_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    User::get_and_validate_post(&id, &user.id, &state.db).await?;
    Post::publish(&id, &state.db).await?;

    refreshed_post_list(&state, &user).await
}

pub async fn trash_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    User::get_and_validate_post(&id, &user.id, &state.db).await?;
    Post::trash(&id, &state.db).await?;

    refreshed_post_list(&state, &user).await
}

pub async fn restore_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    User::get_and_validate_post(&id, &user.id, &state.db).await?;
    Post::restore(&id, &state.db).await?;

    refreshed_post_list(&state, &user).await
}

pub async fn delete_post(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    User::get_and_validate_post(&id, &user.id, &state.db).await?;
    state.db.delete_item::<Post>(&id).await?;

    refreshed_post_list(&state, &user).await
}
