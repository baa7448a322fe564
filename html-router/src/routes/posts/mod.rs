pub mod handlers;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use handlers::{
    create_post, delete_post, patch_post, publish_post, restore_post, show_post_edit_form,
    show_post_form, show_posts_page, trash_post,
};

use crate::html_state::HtmlState;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/posts", get(show_posts_page).post(create_post))
        .route("/posts/new", get(show_post_form))
        .route(
            "/posts/{id}",
            get(show_post_edit_form)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route("/posts/{id}/publish", post(publish_post))
        .route("/posts/{id}/trash", post(trash_post))
        .route("/posts/{id}/restore", post(restore_post))
}
