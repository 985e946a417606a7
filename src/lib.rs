pub mod api;
pub mod config;
pub mod database;
pub mod dns;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Settings;
pub use error::KeeperError;
