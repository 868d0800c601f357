use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    models::playlist::{CreatePlaylistRequest, Playlist, PlaylistQuery},
    services::playlist_service::PlaylistService,
    AppState, Error,
};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            song_id: None,
            playlist_id: None,
        }
    }
}

pub struct PlaylistController;

impl PlaylistController {
    pub async fn create_playlist(
        State(state): State<AppState>,
        Json(payload): Json<CreatePlaylistRequest>,
    ) -> Result<(StatusCode, Json<Playlist>), Error> {
        let playlist = PlaylistService::create(&state.db, payload).await?;

        Ok((StatusCode::CREATED, Json(playlist)))
    }

    /// Récupère les playlists, éventuellement filtrées par `user_id`
    pub async fn get_playlists(
        State(state): State<AppState>,
        Query(query): Query<PlaylistQuery>,
    ) -> Result<Json<Vec<Playlist>>, Error> {
        let result = PlaylistService::list(&state.db, &query).await?;

        Ok(Json(result))
    }

    pub async fn get_playlist(
        State(state): State<AppState>,
        Path(playlist_id): Path<String>,
    ) -> Result<Json<Playlist>, Error> {
        let playlist = PlaylistService::get(&state.db, &playlist_id)
            .await?
            .ok_or(Error::PlaylistNotFound { id: playlist_id })?;

        Ok(Json(playlist))
    }

    pub async fn delete_playlist(
        State(state): State<AppState>,
        Path(playlist_id): Path<String>,
    ) -> Result<Json<MessageResponse>, Error> {
        if !PlaylistService::delete(&state.db, &playlist_id).await? {
            return Err(Error::PlaylistNotFound { id: playlist_id });
        }

        Ok(Json(MessageResponse::new("Playlist deleted successfully")))
    }
}
