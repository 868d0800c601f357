use axum::{routing::get, Router};

use crate::{controllers::playlist_controller::PlaylistController, AppState};

pub struct PlaylistRoutes;

impl PlaylistRoutes {
    pub fn routes() -> Router<AppState> {
        Router::new()
            .route(
                "/",
                get(PlaylistController::get_playlists).post(PlaylistController::create_playlist),
            )
            .route(
                "/{playlist_id}",
                get(PlaylistController::get_playlist).delete(PlaylistController::delete_playlist),
            )
    }
}
