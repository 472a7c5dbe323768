use chrono::Utc;
use scdata_core::config::days_to_millis;
use scdata_core::edits::NoteEditsSource;
use scdata_core::{LatLon, NoteEditAction};

use crate::cli::EditsCommands;
use crate::commands::common::{
    edit_to_list_item, format_edit_lines, normalize_text, AppContext, EditListItem,
};
use crate::error::CliError;

pub fn run_edits(command: EditsCommands, ctx: &AppContext) -> Result<(), CliError> {
    match command {
        EditsCommands::List { unsynced, json } => run_list(unsynced, json, ctx),
        EditsCommands::Count => {
            println!("{}", ctx.edits.get_unsynced_count()?);
            Ok(())
        }
        EditsCommands::Add {
            note_id,
            lat,
            lon,
            create,
            images,
            text,
        } => {
            let id = run_add(note_id, LatLon::new(lat, lon), create, images, &text, ctx)?;
            println!("{id}");
            Ok(())
        }
        EditsCommands::Purge { older_than_days } => {
            let deleted = run_purge(older_than_days, ctx)?;
            println!("Deleted {deleted} synced edit(s)");
            Ok(())
        }
        EditsCommands::Remap {
            old_note_id,
            new_note_id,
        } => {
            let moved = ctx.edits.update_note_id(old_note_id, new_note_id)?;
            println!("Moved {moved} edit(s) from note {old_note_id} to {new_note_id}");
            Ok(())
        }
        EditsCommands::MarkSynced { id } => {
            if !ctx.edits.mark_synced(id)? {
                return Err(CliError::EditNotFound(id));
            }
            println!("Marked edit {id} as synced");
            Ok(())
        }
        EditsCommands::Undo { id } => run_undo(id, ctx),
        EditsCommands::Drop { id } => run_drop(id, ctx),
    }
}

fn run_list(unsynced: bool, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let edits = if unsynced {
        ctx.edits.get_all_unsynced()?
    } else {
        ctx.edits.get_all()?
    };

    if as_json {
        let items = edits
            .iter()
            .map(edit_to_list_item)
            .collect::<Vec<EditListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_edit_lines(&edits) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn run_add(
    note_id: i64,
    position: LatLon,
    create: bool,
    images: Vec<String>,
    text_parts: &[String],
    ctx: &AppContext,
) -> Result<i64, CliError> {
    let text = normalize_text(text_parts).ok_or(CliError::EmptyText)?;
    let action = if create {
        NoteEditAction::Create
    } else {
        NoteEditAction::Comment
    };
    let edit = ctx.edits.add(note_id, action, position, text, images)?;
    Ok(edit.id)
}

pub fn run_purge(older_than_days: Option<u32>, ctx: &AppContext) -> Result<usize, CliError> {
    let now = Utc::now().timestamp_millis();
    let cutoff = older_than_days.map_or_else(
        || ctx.config.synced_edit_cutoff(now),
        |days| now - days_to_millis(days),
    );
    Ok(ctx.edits.delete_synced_older_than(cutoff)?)
}

pub fn run_undo(id: i64, ctx: &AppContext) -> Result<(), CliError> {
    let edit = ctx.edits.get(id)?.ok_or(CliError::EditNotFound(id))?;
    ctx.edits.undo(&edit)?;
    println!("Reverted edit {id} of note {}", edit.note_id);
    Ok(())
}

pub fn run_drop(id: i64, ctx: &AppContext) -> Result<(), CliError> {
    let edit = ctx.edits.get(id)?.ok_or(CliError::EditNotFound(id))?;
    if edit.is_synced {
        return Err(CliError::EditAlreadySynced(id));
    }
    ctx.edits.sync_failed(&edit)?;
    println!("Dropped edit {id} of note {}", edit.note_id);
    Ok(())
}
