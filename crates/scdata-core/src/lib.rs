//! scdata-core - Core library for scdata
//!
//! This crate contains the models, the SQLite persistence layer and the
//! notes-with-edits overlay shared by every scdata front end. Pending note
//! edits are stored locally and merged on top of server-fetched notes so that
//! consumers always see the state the user expects, online or not.

pub mod config;
pub mod db;
pub mod edits;
pub mod error;
pub mod listeners;
pub mod models;
pub mod notes;
pub mod overlay;
pub mod services;
pub mod user;

pub use error::{Error, Result};
pub use models::{
    BoundingBox, ElementGeometry, ElementGeometryEntry, ElementKey, ElementType, LatLon, Note,
    NoteComment, NoteEdit, NoteEditAction,
};
