mod auth;
mod deadline;
mod rate_limit;

pub use auth::auth_layer;
pub use deadline::deadline_layer;
pub use rate_limit::rate_limit_layer;
