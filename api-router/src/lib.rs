use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use middleware_api_auth::api_auth;
use routes::{
    emails::{delete_email, insert_email, list_emails, update_email},
    liveness::live,
    readiness::ready,
    user::{delete_user, get_user, update_user},
};

pub mod api_state;
pub mod error;
mod middleware_api_auth;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints (for k8s/systemd probes)
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    // Protected API endpoints (require auth)
    let protected = Router::new()
        .route("/user", get(get_user).post(update_user).delete(delete_user))
        .route(
            "/emails/{id}",
            get(list_emails)
                .post(update_email)
                .put(insert_email)
                .delete(delete_email),
        )
        .route_layer(from_fn_with_state(app_state.clone(), api_auth));

    public.merge(protected)
}
