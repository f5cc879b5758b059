// Infrastructure layer (shared components)
pub mod config;
pub mod error;
pub mod postgres;

// Domain layer (business logic)
pub mod render;
pub mod store;
pub mod template;

// Application layer
pub mod api;
pub mod server;
