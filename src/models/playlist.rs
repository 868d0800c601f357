use serde::{Deserialize, Serialize};
use surrealdb::sql::Datetime;

use crate::models::song::Song;

pub const PLAYLIST_FIELDS: &str =
    "record::id(id) AS id, user_id, device_id, name, parent_id, songs, created_at";

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub songs: Vec<Song>,
    pub created_at: Datetime,
}

/// Playlist record as written to the `playlist` table.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaylistDocument {
    pub user_id: String,
    pub device_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub songs: Vec<Song>,
    pub created_at: Datetime,
}

impl PlaylistDocument {
    pub fn into_playlist(self, id: String) -> Playlist {
        Playlist {
            id,
            user_id: self.user_id,
            device_id: self.device_id,
            name: self.name,
            parent_id: self.parent_id,
            songs: self.songs,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreatePlaylistRequest {
    pub user_id: String,
    pub device_id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PlaylistQuery {
    pub user_id: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl PlaylistQuery {
    pub fn skip(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    /// Page size; `None` when the caller asked for `limit=0`.
    pub fn limit(&self) -> Option<u32> {
        match self.limit {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => Some(DEFAULT_PAGE_LIMIT),
        }
    }

    /// Empty `user_id=` behaves like no filter.
    pub fn user_filter(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}
