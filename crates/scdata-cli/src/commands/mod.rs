pub mod common;
pub mod config;
pub mod edits;
pub mod geometry;
pub mod notes;
pub mod user;
