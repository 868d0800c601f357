use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{controllers::song_controller::SongController, AppState};

pub struct SongRoutes;

impl SongRoutes {
    pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
        Router::new()
            .route(
                "/add-to-playlist",
                post(SongController::add_song_to_playlist)
                    .layer(DefaultBodyLimit::max(max_upload_bytes)),
            )
            .route("/reconcile", post(SongController::reconcile))
            .route(
                "/{song_id}",
                get(SongController::get_song).delete(SongController::delete_song),
            )
    }
}
