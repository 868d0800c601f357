use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Debug, Serialize, strum_macros::AsRefStr)]
#[serde(tag = "type", content = "data")]
pub enum Error {
    // -- Config errors.
    ConfigInvalidEnv { name: &'static str, reason: String },

    // -- Request errors.
    InvalidInput { reason: String },

    // -- Model errors.
    PlaylistNotFound { id: String },
    SongNotFound { id: String },
    SongNotInPlaylist { song_id: String, playlist_id: String },
    AttachFail {
        song_id: String,
        playlist_id: String,
        reason: String,
    },

    // -- External errors.
    StorageFail(String),
    DbError(String),
    Io(String),
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::InvalidInput { reason } => write!(fmt, "{reason}"),
            Self::PlaylistNotFound { .. } => write!(fmt, "Playlist not found"),
            Self::SongNotFound { .. } => write!(fmt, "Song not found"),
            Self::SongNotInPlaylist { .. } => write!(fmt, "Song or playlist not found"),
            _ => write!(fmt, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, client_error) = self.client_status_and_error();

        if status_code.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let response_body = serde_json::json!({
            "error": client_error.as_ref(),
            "details": self.to_string()
        });

        (status_code, Json(response_body)).into_response()
    }
}

impl Error {
    pub fn client_status_and_error(&self) -> (StatusCode, ClientError) {
        match self {
            Self::InvalidInput { .. } => (StatusCode::BAD_REQUEST, ClientError::INVALID_PARAMS),

            Self::PlaylistNotFound { .. }
            | Self::SongNotFound { .. }
            | Self::SongNotInPlaylist { .. } => {
                (StatusCode::NOT_FOUND, ClientError::RESOURCE_NOT_FOUND)
            }

            Self::AttachFail { .. }
            | Self::StorageFail(_)
            | Self::DbError(_)
            | Self::ConfigInvalidEnv { .. }
            | Self::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::SERVICE_ERROR,
            ),
        }
    }
}

#[derive(Debug, strum_macros::AsRefStr)]
#[allow(non_camel_case_types)]
pub enum ClientError {
    INVALID_PARAMS,
    SERVICE_ERROR,
    RESOURCE_NOT_FOUND,
}

impl From<surrealdb::Error> for Error {
    fn from(err: surrealdb::Error) -> Self {
        Error::DbError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
