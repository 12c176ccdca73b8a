//! Key-value preference storage backed by the `preferences` table.

use crate::{
    entities::{Preference, preference},
    errors::Result,
};
use chrono::Local;
use sea_orm::{Set, prelude::*};

/// Key of the active monthly budget
pub const MONTHLY_BUDGET_KEY: &str = "monthly_budget";
/// Key of the logged-in user id
pub const ACTIVE_USER_KEY: &str = "active_user_id";
/// Key of the date (YYYY-MM-DD) of the last monthly reset
pub const LAST_MONTHLY_RESET_KEY: &str = "last_monthly_reset";

/// Reads a preference value, `None` when the key was never written.
pub async fn get_preference<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = Preference::find()
        .filter(preference::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

/// Writes a preference value, inserting the key if needed.
pub async fn set_preference<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Local::now().naive_local();

    let existing = Preference::find()
        .filter(preference::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: preference::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = preference::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Deletes a preference. Removing a missing key is not an error.
pub async fn remove_preference<C>(db: &C, key: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    Preference::delete_many()
        .filter(preference::Column::Key.eq(key))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_set_then_get() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(get_preference(&db, "color").await?, None);

        set_preference(&db, "color", "blue").await?;
        assert_eq!(get_preference(&db, "color").await?.as_deref(), Some("blue"));

        // Overwrite keeps a single row
        set_preference(&db, "color", "green").await?;
        assert_eq!(get_preference(&db, "color").await?.as_deref(), Some("green"));
        assert_eq!(Preference::find().all(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_remove() -> Result<()> {
        let db = setup_test_db().await?;

        set_preference(&db, "session", "1").await?;
        remove_preference(&db, "session").await?;
        assert_eq!(get_preference(&db, "session").await?, None);

        // Removing again is harmless
        remove_preference(&db, "session").await?;
        Ok(())
    }
}
