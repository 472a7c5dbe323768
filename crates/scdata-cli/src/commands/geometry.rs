use scdata_core::ElementKey;

use crate::cli::GeometryCommands;
use crate::commands::common::{parse_element_keys, AppContext};
use crate::error::CliError;

pub fn run_geometry(command: GeometryCommands, ctx: &AppContext) -> Result<(), CliError> {
    match command {
        GeometryCommands::Get { element } => {
            let key = element.parse::<ElementKey>()?;
            let geometry = ctx
                .db
                .get_geometry(key.element_type, key.element_id)?
                .ok_or_else(|| CliError::GeometryNotFound(key.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&geometry)?);
        }
        GeometryCommands::List => {
            for key in ctx.db.get_all_geometry_keys()? {
                println!("{key}");
            }
        }
        GeometryCommands::Delete { elements } => {
            let deleted = run_delete(&elements, ctx)?;
            println!("Deleted geometry of {deleted} element(s)");
        }
    }
    Ok(())
}

pub fn run_delete(elements: &[String], ctx: &AppContext) -> Result<usize, CliError> {
    let keys = parse_element_keys(elements)?;
    Ok(ctx.db.delete_all_geometries(&keys)?)
}
