use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_htmx::{HxBoosted, HxRequest};
use serde::Serialize;

use common::storage::types::{
    post::{Post, PostFilter, PostStatus},
    user::{PublicUser, User},
};

use crate::{
    html_state::HtmlState,
    middlewares::response_middleware::{HtmlError, TemplateResponse},
    utils::paging::{PagingQuery, PagingState},
    AuthSessionType,
};
use url::form_urlencoded;

#[derive(Serialize)]
pub struct ProfilePageData {
    profile: PublicUser,
    posts: Vec<Post>,
    paging: PagingState,
    base_path: String,
    page_query: String,
}

/// Public profile: the user's card plus their published posts, one page at a
/// time. The paging control receives the fully derived [`PagingState`] and maps
/// `start_page..=end_page` into links.
pub async fn show_profile(
    State(state): State<HtmlState>,
    Path(username): Path<String>,
    Query(query): Query<PagingQuery>,
    HxRequest(is_htmx): HxRequest,
    HxBoosted(is_boosted): HxBoosted,
) -> Result<impl IntoResponse, HtmlError> {
    let Some(user) = User::find_by_username(&username, &state.db).await? else {
        return Ok(TemplateResponse::not_found());
    };

    let filter = PostFilter {
        status: Some(PostStatus::Publish),
        terms: query.terms(),
        order_by: query.order_by.clone(),
        order: query.order.clone(),
    };

    // The slice is requested with the raw page; beyond-the-end pages simply
    // come back empty and the paging control degrades gracefully.
    let offset = (query.page() - 1) * query.per_page();
    let (posts, total) =
        Post::list_page(&user.id, &filter, query.per_page(), offset, &state.db).await?;

    let paging = PagingState::from_query(&query, total);
    let page_query = preserved_page_query(&query);

    let data = ProfilePageData {
        profile: PublicUser::from(&user),
        posts,
        paging,
        base_path: format!("/{username}"),
        page_query,
    };

    if is_htmx && !is_boosted {
        Ok(TemplateResponse::new_partial(
            "profile/base.html",
            "main",
            data,
        ))
    } else {
        Ok(TemplateResponse::new_template("profile/base.html", data))
    }
}

#[derive(Serialize)]
pub struct PublishedPostData {
    profile: PublicUser,
    post: Post,
}

/// A single post under `/{username}/{slug}`. Unpublished posts are visible to
/// their author only.
pub async fn show_published_post(
    State(state): State<HtmlState>,
    auth: AuthSessionType,
    Path((username, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, HtmlError> {
    let Some(user) = User::find_by_username(&username, &state.db).await? else {
        return Ok(TemplateResponse::not_found());
    };

    let Some(post) = Post::get_by_slug(&user.id, &slug, &state.db).await? else {
        return Ok(TemplateResponse::not_found());
    };

    let is_owner = auth
        .current_user
        .as_ref()
        .is_some_and(|viewer| viewer.id == user.id);
    if post.status != PostStatus::Publish && !is_owner {
        return Ok(TemplateResponse::not_found());
    }

    Ok(TemplateResponse::new_template(
        "profile/post.html",
        PublishedPostData {
            profile: PublicUser::from(&user),
            post,
        },
    ))
}

/// Query-string tail appended to every page link so filters survive paging.
fn preserved_page_query(query: &PagingQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if let Some(per_page) = query.per_page {
        serializer.append_pair("per_page", &per_page.to_string());
    }
    if let Some(page_size) = query.page_size {
        serializer.append_pair("page_size", &page_size.to_string());
    }
    if let Some(terms) = query.terms() {
        serializer.append_pair("q", &terms);
    }
    if let Some(order_by) = query.order_by.as_deref() {
        serializer.append_pair("order_by", order_by);
    }
    if let Some(order) = query.order.as_deref() {
        serializer.append_pair("order", order);
    }

    let tail = serializer.finish();
    if tail.is_empty() {
        String::new()
    } else {
        format!("&{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_preserves_filters() {
        let query = PagingQuery {
            page: Some(3),
            per_page: Some(25),
            q: Some("rust".to_string()),
            order: Some("asc".to_string()),
            ..PagingQuery::default()
        };

        let tail = preserved_page_query(&query);
        assert!(tail.starts_with('&'));
        assert!(tail.contains("per_page=25"));
        assert!(tail.contains("q=rust"));
        assert!(tail.contains("order=asc"));
        // The page itself is supplied per link, never preserved
        assert!(!tail.contains("page=3"));
    }

    #[test]
    fn page_query_is_empty_without_filters() {
        let query = PagingQuery::default();
        assert_eq!(preserved_page_query(&query), "");
    }
}
