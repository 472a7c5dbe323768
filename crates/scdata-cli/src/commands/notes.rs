use chrono::Utc;
use scdata_core::config::days_to_millis;

use crate::cli::NotesCommands;
use crate::commands::common::{format_note_lines, format_timestamp, parse_bbox, AppContext};
use crate::error::CliError;

pub fn run_notes(command: NotesCommands, ctx: &AppContext) -> Result<(), CliError> {
    match command {
        NotesCommands::Show { id, json } => run_show(id, json, ctx),
        NotesCommands::In { bbox, json } => run_in(&bbox, json, ctx),
        NotesCommands::Positions { bbox } => {
            let bbox = parse_bbox(&bbox)?;
            for position in ctx.overlay.get_all_positions(&bbox)? {
                println!("{},{}", position.latitude, position.longitude);
            }
            Ok(())
        }
        NotesCommands::Prune { older_than_days } => {
            let cutoff = Utc::now().timestamp_millis() - days_to_millis(older_than_days);
            let deleted = ctx.notes.delete_older_than(cutoff)?;
            println!("Deleted {deleted} note(s)");
            Ok(())
        }
    }
}

fn run_show(id: i64, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let note = ctx.overlay.get(id)?.ok_or(CliError::NoteNotFound(id))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    for line in format_note_lines(std::slice::from_ref(&note)) {
        println!("{line}");
    }
    for comment in &note.comments {
        let author = comment
            .user
            .as_ref()
            .map_or("anonymous", |user| user.display_name.as_str());
        println!(
            "  {}  {:?} by {author}",
            format_timestamp(comment.timestamp),
            comment.action
        );
        for line in comment.text.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

fn run_in(bbox: &str, as_json: bool, ctx: &AppContext) -> Result<(), CliError> {
    let bbox = parse_bbox(bbox)?;
    let mut notes = ctx.overlay.get_all(&bbox)?;
    notes.sort_by_key(|note| note.id);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }
    Ok(())
}
