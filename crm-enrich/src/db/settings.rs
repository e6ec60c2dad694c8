//! Settings database operations
//!
//! Key-value accessors for provider API keys.

use crm_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Get the People Data Labs API key
///
/// **Returns:** Some(key) if set, None otherwise
pub async fn get_pdl_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "pdl_api_key").await
}

pub async fn set_pdl_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, "pdl_api_key", key).await
}

/// Get the Apollo API key
pub async fn get_apollo_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "apollo_api_key").await
}

pub async fn set_apollo_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, "apollo_api_key", key).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    #[tokio::test]
    async fn test_provider_keys_round_trip() {
        let db = init_memory_pool().await.unwrap();

        assert_eq!(get_pdl_api_key(&db).await.unwrap(), None);

        set_pdl_api_key(&db, "pdl-key".to_string()).await.unwrap();
        set_apollo_api_key(&db, "apollo-key".to_string()).await.unwrap();

        assert_eq!(get_pdl_api_key(&db).await.unwrap().as_deref(), Some("pdl-key"));
        assert_eq!(get_apollo_api_key(&db).await.unwrap().as_deref(), Some("apollo-key"));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = init_memory_pool().await.unwrap();

        set_pdl_api_key(&db, "old".to_string()).await.unwrap();
        set_pdl_api_key(&db, "new".to_string()).await.unwrap();

        assert_eq!(get_pdl_api_key(&db).await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_parse_failure_is_config_error() {
        let db = init_memory_pool().await.unwrap();
        set_setting(&db, "retry_limit", "many").await.unwrap();

        let result = get_setting::<u32>(&db, "retry_limit").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
