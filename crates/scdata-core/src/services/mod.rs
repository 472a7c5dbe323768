//! Shared services used by the controllers and clients

mod database;

pub use database::DatabaseService;
