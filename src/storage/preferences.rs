use super::schema::Database;
use super::types::StoreError;

impl Database {
    // ========================================================================
    // User Preferences
    // ========================================================================

    /// Get a single preference value by key.
    ///
    /// Keys use the dotted convention, e.g. `view.entries_per_page`.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a preference value (UPSERT).
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All preferences under a key prefix, ordered by key.
    ///
    /// `_` and `%` in the prefix are matched literally.
    pub async fn get_preferences_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM user_preferences WHERE key LIKE ? ESCAPE '\\' ORDER BY key",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_preference_missing() {
        let db = test_db().await;
        assert_eq!(db.get_preference("view.unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_preference_upsert() {
        let db = test_db().await;
        db.set_preference("view.key_nav_enabled", "false")
            .await
            .unwrap();
        db.set_preference("view.key_nav_enabled", "true")
            .await
            .unwrap();

        let value = db.get_preference("view.key_nav_enabled").await.unwrap();
        assert_eq!(value, Some("true".to_string()));
    }

    #[tokio::test]
    async fn test_get_preferences_by_prefix() {
        let db = test_db().await;
        db.set_preference("view.shown_entries", "unread")
            .await
            .unwrap();
        db.set_preference("view.entries_per_page", "30")
            .await
            .unwrap();
        db.set_preference("viewer.other", "x").await.unwrap();

        let prefs = db.get_preferences_by_prefix("view.").await.unwrap();
        assert_eq!(
            prefs,
            vec![
                ("view.entries_per_page".to_string(), "30".to_string()),
                ("view.shown_entries".to_string(), "unread".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_prefix_underscore_is_literal() {
        let db = test_db().await;
        db.set_preference("view.show_authors", "true").await.unwrap();
        db.set_preference("view.showXauthors", "true").await.unwrap();

        let prefs = db.get_preferences_by_prefix("view.show_").await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].0, "view.show_authors");
    }
}
