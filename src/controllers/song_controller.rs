use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    controllers::playlist_controller::MessageResponse,
    models::song::{AudioUpload, DeleteSongQuery, NewSong, ReconcileReport, Song},
    services::song_service::SongService,
    AppState, Error,
};

/// Fields of the `add-to-playlist` multipart form, as received.
#[derive(Default)]
struct SongUploadForm {
    playlist_id: Option<String>,
    user_id: Option<String>,
    device_id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<String>,
    audio_file: Option<AudioUpload>,
}

fn multipart_error(err: MultipartError) -> Error {
    Error::InvalidInput {
        reason: format!("Malformed multipart form: {}", err.body_text()),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, Error> {
    value.ok_or_else(|| Error::InvalidInput {
        reason: format!("Missing form field '{}'", field),
    })
}

/// Blank optional form values count as absent.
fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SongUploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, Error> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "audio_file" {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidInput {
                        reason: "audio_file must be a file upload".to_string(),
                    })?;
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();

                form.audio_file = Some(AudioUpload {
                    filename,
                    content_type,
                    bytes,
                });
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            match name.as_str() {
                "playlist_id" => form.playlist_id = Some(value),
                "user_id" => form.user_id = Some(value),
                "device_id" => form.device_id = Some(value),
                "title" => form.title = Some(value),
                "artist" => form.artist = Some(value),
                "album" => form.album = Some(value),
                "duration" => form.duration = Some(value),
                _ => tracing::debug!(field = %name, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn into_parts(self) -> Result<(NewSong, AudioUpload), Error> {
        let duration = optional(self.duration)
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|_| Error::InvalidInput {
                    reason: "duration must be a whole number of seconds".to_string(),
                })
            })
            .transpose()?;

        let song = NewSong {
            playlist_id: required(self.playlist_id, "playlist_id")?,
            user_id: required(self.user_id, "user_id")?,
            device_id: required(self.device_id, "device_id")?,
            title: required(self.title, "title")?,
            artist: optional(self.artist),
            album: optional(self.album),
            duration,
        };

        let upload = self.audio_file.ok_or_else(|| Error::InvalidInput {
            reason: "Missing form field 'audio_file'".to_string(),
        })?;

        Ok((song, upload))
    }
}

pub struct SongController;

impl SongController {
    /// Receives an audio file, stores it, records the song and attaches it to
    /// `playlist_id`.
    pub async fn add_song_to_playlist(
        State(state): State<AppState>,
        multipart: Multipart,
    ) -> Result<(StatusCode, Json<Song>), Error> {
        let (song, upload) = SongUploadForm::read(multipart).await?.into_parts()?;

        let song =
            SongService::upload_and_attach(&state.db, state.storage.as_ref(), song, upload).await?;

        Ok((StatusCode::CREATED, Json(song)))
    }

    pub async fn get_song(
        State(state): State<AppState>,
        Path(song_id): Path<String>,
    ) -> Result<Json<Song>, Error> {
        let song = SongService::get(&state.db, &song_id)
            .await?
            .ok_or(Error::SongNotFound { id: song_id })?;

        Ok(Json(song))
    }

    /// With `playlist_id`, detaches the song from that playlist only.
    /// Without it, deletes the song everywhere along with its audio file.
    pub async fn delete_song(
        State(state): State<AppState>,
        Path(song_id): Path<String>,
        Query(query): Query<DeleteSongQuery>,
    ) -> Result<Json<MessageResponse>, Error> {
        if let Some(playlist_id) = optional(query.playlist_id) {
            if !SongService::remove_from_playlist(&state.db, &song_id, &playlist_id).await? {
                return Err(Error::SongNotInPlaylist {
                    song_id,
                    playlist_id,
                });
            }

            return Ok(Json(MessageResponse {
                message: "Song removed from playlist".to_string(),
                song_id: Some(song_id),
                playlist_id: Some(playlist_id),
            }));
        }

        let existing = SongService::get(&state.db, &song_id).await?.found();

        if !SongService::delete(&state.db, &song_id).await? {
            return Err(Error::SongNotFound { id: song_id });
        }

        if let Some(song) = existing {
            match state.storage.delete(&song.storage_path).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    storage_path = %song.storage_path,
                    "object store did not delete audio file"
                ),
                Err(err) => tracing::warn!(
                    storage_path = %song.storage_path,
                    error = ?err,
                    "failed to delete audio file"
                ),
            }
        }

        Ok(Json(MessageResponse {
            message: "Song deleted successfully".to_string(),
            song_id: Some(song_id),
            playlist_id: None,
        }))
    }

    pub async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileReport>, Error> {
        let report = SongService::reconcile(&state.db).await?;

        Ok(Json(report))
    }
}
