use surrealdb::engine::any::Any;
use surrealdb::Surreal;

use crate::{
    helpers::thing_helpers::create_playlist_thing,
    models::database_helpers::RecordKey,
    Error as AppError,
};

/// Vérifie si une playlist existe dans la base de données.
/// `playlist_key` doit déjà être une clé validée.
pub async fn playlist_exists(db: &Surreal<Any>, playlist_key: &str) -> Result<bool, AppError> {
    let playlist_thing = create_playlist_thing(playlist_key);

    let playlist_check: Option<RecordKey> = db
        .query("SELECT record::id(id) AS id FROM $playlist")
        .bind(("playlist", playlist_thing))
        .await?
        .take(0)?;

    Ok(playlist_check.is_some())
}
