use scdata_core::models::User;
use scdata_core::user::UserIdentity;

use crate::cli::UserCommands;
use crate::commands::common::AppContext;
use crate::error::CliError;

pub fn run_user(command: UserCommands, ctx: &AppContext) -> Result<(), CliError> {
    match command {
        UserCommands::Show => match ctx.user.current_user()? {
            Some(user) => println!("{} ({})", user.display_name, user.id),
            None => println!("anonymous"),
        },
        UserCommands::Set { id, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::Config("User name cannot be empty".to_string()));
            }
            ctx.user.set(&User::new(id, name))?;
            println!("Edits will be authored by {name} ({id})");
        }
        UserCommands::Clear => {
            if ctx.user.clear()? {
                println!("Logged out");
            } else {
                println!("No user was stored");
            }
        }
    }
    Ok(())
}
