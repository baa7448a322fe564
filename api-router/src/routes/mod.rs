pub mod emails;
pub mod liveness;
pub mod readiness;
pub mod user;
