//! Identity of the logged-in user

use crate::db::{SettingsRepository, SqliteSettingsRepository};
use crate::models::User;
use crate::services::DatabaseService;
use crate::{Error, Result};

const USER_ID_KEY: &str = "user.id";
const USER_NAME_KEY: &str = "user.name";

/// Source of the user that authors local edits
pub trait UserIdentity: Send + Sync {
    /// The logged-in user, `None` when anonymous
    fn current_user(&self) -> Result<Option<User>>;
}

/// Persists the logged-in user in the settings table
#[derive(Clone)]
pub struct UserStore {
    db: DatabaseService,
}

impl UserStore {
    pub const fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub fn set(&self, user: &User) -> Result<()> {
        self.db.with_connection(|conn| {
            let tx = conn.unchecked_transaction()?;
            let settings = SqliteSettingsRepository::new(&tx);
            settings.set(USER_ID_KEY, &user.id.to_string())?;
            settings.set(USER_NAME_KEY, &user.display_name)?;
            tx.commit()?;
            Ok(())
        })?;
        tracing::debug!("Logged in as {} ({})", user.display_name, user.id);
        Ok(())
    }

    /// Forget the user, returning whether one was stored
    pub fn clear(&self) -> Result<bool> {
        let removed_id = self.db.remove_setting(USER_ID_KEY)?;
        let removed_name = self.db.remove_setting(USER_NAME_KEY)?;
        Ok(removed_id || removed_name)
    }
}

impl UserIdentity for UserStore {
    fn current_user(&self) -> Result<Option<User>> {
        let Some(id) = self.db.get_setting(USER_ID_KEY)? else {
            return Ok(None);
        };
        let id = id
            .parse::<i64>()
            .map_err(|e| Error::InvalidInput(format!("stored user id {id:?}: {e}")))?;
        let display_name = self.db.get_setting(USER_NAME_KEY)?.unwrap_or_default();
        Ok(Some(User { id, display_name }))
    }
}
