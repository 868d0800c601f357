use chrono::Utc;
use serde::de::IgnoredAny;
use surrealdb::{engine::any::Any, sql::Datetime, Surreal};

use crate::{
    helpers::{
        playlist_helpers::playlist_exists,
        thing_helpers::{create_playlist_thing, parse_record_key, PLAYLIST_TABLE},
    },
    models::{
        database_helpers::RecordKey,
        lookup::Lookup,
        playlist::{
            CreatePlaylistRequest, Playlist, PlaylistDocument, PlaylistQuery, PLAYLIST_FIELDS,
        },
    },
    Error, Result,
};

pub struct PlaylistService;

impl PlaylistService {
    fn require_non_blank(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::InvalidInput {
                reason: format!("{} must not be empty", field),
            });
        }
        Ok(())
    }

    /// Creates an empty playlist. A `parent_id`, when given, must name an
    /// existing playlist at this moment; nothing keeps it valid afterwards.
    pub async fn create(db: &Surreal<Any>, playlist: CreatePlaylistRequest) -> Result<Playlist> {
        Self::require_non_blank(&playlist.user_id, "user_id")?;
        Self::require_non_blank(&playlist.device_id, "device_id")?;
        Self::require_non_blank(&playlist.name, "name")?;

        let parent_id = match playlist
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        {
            Some(raw) => {
                let parent_key =
                    parse_record_key(PLAYLIST_TABLE, raw).ok_or_else(|| Error::InvalidInput {
                        reason: "Invalid parent_id".to_string(),
                    })?;

                if !playlist_exists(db, parent_key).await? {
                    return Err(Error::InvalidInput {
                        reason: "Parent playlist not found".to_string(),
                    });
                }

                Some(parent_key.to_string())
            }
            None => None,
        };

        let document = PlaylistDocument {
            user_id: playlist.user_id,
            device_id: playlist.device_id,
            name: playlist.name,
            parent_id,
            songs: Vec::new(),
            created_at: Datetime::from(Utc::now()),
        };

        let mut created_records: Vec<RecordKey> = db
            .query("CREATE playlist:ulid() CONTENT $content RETURN record::id(id) AS id")
            .bind(("content", document.clone()))
            .await?
            .take(0)?;

        let playlist_id = created_records
            .pop()
            .ok_or_else(|| Error::DbError("Playlist creation returned no record".to_string()))?
            .id;

        tracing::debug!(playlist_id = %playlist_id, "playlist created");

        Ok(document.into_playlist(playlist_id))
    }

    pub async fn get(db: &Surreal<Any>, playlist_id: &str) -> Result<Lookup<Playlist>> {
        let Some(playlist_key) = parse_record_key(PLAYLIST_TABLE, playlist_id) else {
            return Ok(Lookup::NotFound);
        };

        let playlist: Option<Playlist> = db
            .query(format!("SELECT {PLAYLIST_FIELDS} FROM $playlist"))
            .bind(("playlist", create_playlist_thing(playlist_key)))
            .await?
            .take(0)?;

        Ok(playlist.into())
    }

    /// Lists playlists in storage order, optionally restricted to one user.
    /// `limit=0` lifts the page size cap.
    pub async fn list(db: &Surreal<Any>, query: &PlaylistQuery) -> Result<Vec<Playlist>> {
        let user_clause = match query.user_filter() {
            Some(_) => " WHERE user_id = $user_id",
            None => "",
        };
        let limit_clause = match query.limit() {
            Some(_) => " LIMIT $limit",
            None => "",
        };

        let playlists: Vec<Playlist> = db
            .query(format!(
                "SELECT {PLAYLIST_FIELDS} FROM playlist{user_clause}{limit_clause} START $skip"
            ))
            .bind(("user_id", query.user_filter().unwrap_or_default().to_string()))
            .bind(("limit", query.limit().unwrap_or_default()))
            .bind(("skip", query.skip()))
            .await?
            .take(0)?;

        Ok(playlists)
    }

    /// Removes the playlist document only. Canonical songs stay, and child
    /// playlists keep pointing at the removed id.
    pub async fn delete(db: &Surreal<Any>, playlist_id: &str) -> Result<bool> {
        let Some(playlist_key) = parse_record_key(PLAYLIST_TABLE, playlist_id) else {
            return Ok(false);
        };

        let removed: Vec<IgnoredAny> = db
            .query("DELETE playlist WHERE id = $playlist RETURN BEFORE")
            .bind(("playlist", create_playlist_thing(playlist_key)))
            .await?
            .take(0)?;

        Ok(!removed.is_empty())
    }
}
