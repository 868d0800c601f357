use axum::{routing::get, Router};

use crate::{
    controllers::health_controller::HealthController,
    routes::{playlist_routes::PlaylistRoutes, song_routes::SongRoutes},
    AppState,
};

pub mod playlist_routes;
pub mod song_routes;

pub fn app(app_state: AppState, max_upload_bytes: usize) -> Router {
    let routes_api = Router::new()
        .nest("/playlists", PlaylistRoutes::routes())
        .nest("/songs", SongRoutes::routes(max_upload_bytes));

    Router::new()
        .route("/", get(HealthController::root))
        .route("/health", get(HealthController::health))
        .nest("/api/v1", routes_api)
        .with_state(app_state)
}
