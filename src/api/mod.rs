//! API layer - HTTP endpoint handlers.

mod handlers;
mod health;
mod routes;

pub use handlers::{home, snippet_create, snippet_view};
pub use health::health;
pub use routes::app_routes;
