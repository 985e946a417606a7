pub mod handlers;
pub mod models;
pub mod render;
pub mod server;
pub mod validators;
