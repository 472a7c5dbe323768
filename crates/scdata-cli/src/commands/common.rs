use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use scdata_core::config::{DataConfig, CONFIG_FILE_NAME};
use scdata_core::edits::NoteEditsController;
use scdata_core::notes::NoteController;
use scdata_core::overlay::NotesWithEditsSource;
use scdata_core::services::DatabaseService;
use scdata_core::user::UserStore;
use scdata_core::{BoundingBox, ElementKey, Note, NoteEdit};
use serde::Serialize;

use crate::error::CliError;

const DB_FILE_NAME: &str = "scdata.db";

/// Everything a command needs, wired the same way an app would wire it
pub struct AppContext {
    pub db: DatabaseService,
    pub notes: Arc<NoteController>,
    pub edits: Arc<NoteEditsController>,
    pub user: Arc<UserStore>,
    pub overlay: Arc<NotesWithEditsSource>,
    pub config: DataConfig,
}

impl AppContext {
    pub fn new(db: DatabaseService, config: DataConfig) -> Self {
        let notes = Arc::new(NoteController::new(db.clone()));
        let edits = Arc::new(NoteEditsController::new(db.clone()));
        let user = Arc::new(UserStore::new(db.clone()));
        let overlay = NotesWithEditsSource::new(notes.clone(), edits.clone(), user.clone());
        Self {
            db,
            notes,
            edits,
            user,
            overlay,
            config,
        }
    }

    pub fn open(db_path: &Path, config: DataConfig) -> Result<Self, CliError> {
        let db = DatabaseService::open_path(db_path)?;
        Ok(Self::new(db, config))
    }
}

#[derive(Debug, Serialize)]
pub struct EditListItem {
    pub id: i64,
    pub note_id: i64,
    pub action: String,
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_paths: Vec<String>,
    pub created_at: i64,
    pub created_at_iso: String,
    pub is_synced: bool,
}

pub fn edit_to_list_item(edit: &NoteEdit) -> EditListItem {
    EditListItem {
        id: edit.id,
        note_id: edit.note_id,
        action: edit.action.to_string(),
        text: edit.text.clone(),
        latitude: edit.position.latitude,
        longitude: edit.position.longitude,
        image_paths: edit.image_paths.clone(),
        created_at: edit.created_at,
        created_at_iso: format_timestamp(edit.created_at),
        is_synced: edit.is_synced,
    }
}

pub fn format_edit_lines(edits: &[NoteEdit]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    edits
        .iter()
        .map(|edit| {
            let state = if edit.is_synced { "synced" } else { "pending" };
            let photos = if edit.has_images() {
                format!("  [{} photo(s)]", edit.image_paths.len())
            } else {
                String::new()
            };
            format!(
                "{:>6}  note={:<10}  {:<7}  {:<7}  {:<10}  {}{photos}",
                edit.id,
                edit.note_id,
                edit.action.as_str(),
                state,
                format_relative_time(edit.created_at, now_ms),
                text_preview(&edit.text, 40)
            )
        })
        .collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            format!(
                "{:>10}  {:<6}  {:>9.5},{:<10.5}  {:>2} comment(s)  {}",
                note.id,
                note.status.as_str(),
                note.position.latitude,
                note.position.longitude,
                note.comments.len(),
                text_preview(note.description().unwrap_or(""), 40)
            )
        })
        .collect()
}

pub fn text_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn normalize_text(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_bbox(value: &str) -> Result<BoundingBox, CliError> {
    let invalid = || CliError::InvalidBoundingBox(value.to_string());
    let numbers = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let &[min_latitude, min_longitude, max_latitude, max_longitude] = numbers.as_slice() else {
        return Err(invalid());
    };
    if min_latitude > max_latitude || min_longitude > max_longitude {
        return Err(invalid());
    }
    Ok(BoundingBox::new(
        min_latitude,
        min_longitude,
        max_latitude,
        max_longitude,
    ))
}

pub fn parse_element_keys(values: &[String]) -> Result<Vec<ElementKey>, CliError> {
    values
        .iter()
        .map(|value| value.parse::<ElementKey>().map_err(CliError::from))
        .collect()
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("scdata").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("scdata").join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}

/// `--db-path`, then `SCDATA_DB_PATH`, then the config file, then the default
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &DataConfig,
) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path {
        return Ok(path);
    }
    Ok(config.resolve_database_path(&default_db_path()?))
}
