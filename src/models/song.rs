use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Datetime;

use crate::{services::storage_service::StoredObject, Error, Result};

/// Projection used by every canonical song read.
pub const SONG_FIELDS: &str = "record::id(id) AS id, user_id, device_id, title, artist, album, \
    duration, file_id, file_url, storage_path, file_size, original_filename, created_at";

/// A song as returned by the API. The same shape is embedded, with `id` as a
/// plain string, in the `songs` array of every playlist it was attached to.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Song {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<u32>, // seconds

    // Object store pointers
    pub file_id: String,
    pub file_url: String,
    pub storage_path: String,
    pub file_size: u64,
    pub original_filename: String,

    pub created_at: Datetime,
}

/// Canonical song record as written to the `song` table; the key is generated
/// by the store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SongDocument {
    pub user_id: String,
    pub device_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<u32>,
    pub file_id: String,
    pub file_url: String,
    pub storage_path: String,
    pub file_size: u64,
    pub original_filename: String,
    pub created_at: Datetime,
}

impl SongDocument {
    pub fn new(song: NewSong, stored: &StoredObject) -> Self {
        Self {
            user_id: song.user_id,
            device_id: song.device_id,
            title: song.title,
            artist: song.artist,
            album: song.album,
            duration: song.duration,
            file_id: stored.file_id.clone(),
            file_url: stored.file_url.clone(),
            storage_path: stored.storage_path.clone(),
            file_size: stored.file_size,
            original_filename: stored.original_filename.clone(),
            created_at: Datetime::from(Utc::now()),
        }
    }

    pub fn into_song(self, id: String) -> Song {
        Song {
            id,
            user_id: self.user_id,
            device_id: self.device_id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            duration: self.duration,
            file_id: self.file_id,
            file_url: self.file_url,
            storage_path: self.storage_path,
            file_size: self.file_size,
            original_filename: self.original_filename,
            created_at: self.created_at,
        }
    }
}

/// Song metadata submitted alongside an audio upload.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub playlist_id: String,
    pub user_id: String,
    pub device_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<u32>,
}

impl NewSong {
    pub fn validate(&self) -> Result<()> {
        for (value, field) in [
            (&self.user_id, "user_id"),
            (&self.device_id, "device_id"),
            (&self.title, "title"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput {
                    reason: format!("{} must not be empty", field),
                });
            }
        }
        Ok(())
    }
}

/// Raw audio payload taken from the multipart form.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Canonical songs that no playlist embeds.
    pub orphaned_songs: Vec<String>,
    /// Embedded copies whose canonical record no longer exists.
    pub dangling_copies: Vec<String>,
    pub playlists_repaired: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeleteSongQuery {
    pub playlist_id: Option<String>,
}
