use std::collections::BTreeSet;

use serde::de::IgnoredAny;
use surrealdb::{engine::any::Any, Surreal};

use crate::{
    helpers::{
        playlist_helpers::playlist_exists,
        thing_helpers::{
            create_playlist_thing, create_song_thing, parse_record_key, PLAYLIST_TABLE, SONG_TABLE,
        },
    },
    models::{
        database_helpers::RecordKey,
        lookup::Lookup,
        song::{AudioUpload, NewSong, ReconcileReport, Song, SongDocument, SONG_FIELDS},
    },
    services::storage_service::{ObjectStore, StoredObject},
    Error, Result,
};

pub struct SongService;

impl SongService {
    /// Stores the audio payload, then records the song and attaches it.
    ///
    /// The playlist is checked before the upload so a rejected request leaves
    /// nothing behind. After that, three writes happen in sequence with no
    /// rollback between them:
    /// 1. object store upload
    /// 2. canonical `song` insert
    /// 3. embedded copy pushed into the playlist
    ///
    /// A failure at step 2 leaves an unreferenced stored object. A failure at
    /// step 3 leaves a canonical song no playlist embeds; it is reported by
    /// [`SongService::reconcile`].
    pub async fn upload_and_attach(
        db: &Surreal<Any>,
        store: &dyn ObjectStore,
        song: NewSong,
        upload: AudioUpload,
    ) -> Result<Song> {
        song.validate()?;
        Self::require_playlist(db, &song.playlist_id).await?;

        let stored = store
            .store(
                &upload.bytes,
                &song.user_id,
                &upload.filename,
                upload.content_type.as_deref(),
            )
            .await?;

        Self::create_and_attach(db, song, &stored)
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    storage_path = %stored.storage_path,
                    error = ?err,
                    "audio stored but song was not attached"
                );
            })
    }

    /// Inserts the canonical song record then appends a copy of it to the
    /// target playlist. The playlist is checked before anything is written.
    pub async fn create_and_attach(
        db: &Surreal<Any>,
        song: NewSong,
        stored: &StoredObject,
    ) -> Result<Song> {
        song.validate()?;
        let playlist_key = Self::require_playlist(db, &song.playlist_id).await?;

        let song = Self::insert_canonical(db, song, stored).await?;

        Self::attach(db, &playlist_key, song).await
    }

    /// Returns the bare key of an existing playlist, or the 400 to send back.
    async fn require_playlist(db: &Surreal<Any>, playlist_id: &str) -> Result<String> {
        let playlist_key =
            parse_record_key(PLAYLIST_TABLE, playlist_id).ok_or_else(|| Error::InvalidInput {
                reason: "Invalid playlist_id".to_string(),
            })?;

        if !playlist_exists(db, playlist_key).await? {
            return Err(Error::InvalidInput {
                reason: "Playlist not found".to_string(),
            });
        }

        Ok(playlist_key.to_string())
    }

    async fn insert_canonical(
        db: &Surreal<Any>,
        song: NewSong,
        stored: &StoredObject,
    ) -> Result<Song> {
        let document = SongDocument::new(song, stored);

        let mut created_records: Vec<RecordKey> = db
            .query("CREATE song:ulid() CONTENT $content RETURN record::id(id) AS id")
            .bind(("content", document.clone()))
            .await?
            .take(0)?;

        let song_id = created_records
            .pop()
            .ok_or_else(|| Error::DbError("Song creation returned no record".to_string()))?
            .id;

        Ok(document.into_song(song_id))
    }

    /// Second half of the attach. On failure the canonical record stays and
    /// the error names it.
    async fn attach(db: &Surreal<Any>, playlist_key: &str, song: Song) -> Result<Song> {
        match Self::embed_copy(db, playlist_key, &song).await {
            Ok(true) => {
                tracing::debug!(song_id = %song.id, playlist_id = %playlist_key, "song attached");
                Ok(song)
            }
            Ok(false) => Err(Error::AttachFail {
                song_id: song.id,
                playlist_id: playlist_key.to_string(),
                reason: "playlist disappeared before the song could be attached".to_string(),
            }),
            Err(err) => Err(Error::AttachFail {
                song_id: song.id,
                playlist_id: playlist_key.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    async fn embed_copy(db: &Surreal<Any>, playlist_key: &str, song: &Song) -> Result<bool> {
        let updated: Vec<IgnoredAny> = db
            .query("UPDATE playlist SET songs += $song WHERE id = $playlist RETURN BEFORE")
            .bind(("song", song.clone()))
            .bind(("playlist", create_playlist_thing(playlist_key)))
            .await?
            .take(0)?;

        Ok(!updated.is_empty())
    }

    pub async fn get(db: &Surreal<Any>, song_id: &str) -> Result<Lookup<Song>> {
        let Some(song_key) = parse_record_key(SONG_TABLE, song_id) else {
            return Ok(Lookup::NotFound);
        };

        let song: Option<Song> = db
            .query(format!("SELECT {SONG_FIELDS} FROM $song"))
            .bind(("song", create_song_thing(song_key)))
            .await?
            .take(0)?;

        Ok(song.into())
    }

    /// Drops the embedded copy from one playlist. The canonical record stays.
    pub async fn remove_from_playlist(
        db: &Surreal<Any>,
        song_id: &str,
        playlist_id: &str,
    ) -> Result<bool> {
        let (Some(song_key), Some(playlist_key)) = (
            parse_record_key(SONG_TABLE, song_id),
            parse_record_key(PLAYLIST_TABLE, playlist_id),
        ) else {
            return Ok(false);
        };

        let updated: Vec<IgnoredAny> = db
            .query(
                "UPDATE playlist SET songs = songs[WHERE id != $song_id] \
                 WHERE id = $playlist AND songs.id CONTAINS $song_id RETURN BEFORE",
            )
            .bind(("song_id", song_key.to_string()))
            .bind(("playlist", create_playlist_thing(playlist_key)))
            .await?
            .take(0)?;

        Ok(!updated.is_empty())
    }

    /// Removes every embedded copy, then the canonical record. Only the
    /// canonical deletion decides the return value.
    pub async fn delete(db: &Surreal<Any>, song_id: &str) -> Result<bool> {
        let Some(song_key) = parse_record_key(SONG_TABLE, song_id) else {
            return Ok(false);
        };

        let detached = Self::pull_from_all_playlists(db, song_key).await?;
        tracing::debug!(song_id = %song_key, playlists = detached, "embedded copies removed");

        let removed: Vec<IgnoredAny> = db
            .query("DELETE song WHERE id = $song RETURN BEFORE")
            .bind(("song", create_song_thing(song_key)))
            .await?
            .take(0)?;

        Ok(!removed.is_empty())
    }

    /// Returns the number of playlists that held a copy.
    async fn pull_from_all_playlists(db: &Surreal<Any>, song_key: &str) -> Result<usize> {
        let updated: Vec<IgnoredAny> = db
            .query(
                "UPDATE playlist SET songs = songs[WHERE id != $song_id] \
                 WHERE songs.id CONTAINS $song_id RETURN BEFORE",
            )
            .bind(("song_id", song_key.to_string()))
            .await?
            .take(0)?;

        Ok(updated.len())
    }

    /// Compares canonical records with embedded copies.
    ///
    /// Copies pointing at a deleted song are removed from every playlist.
    /// Canonical songs with no copy are only reported: detaching a song from
    /// its last playlist produces them on purpose.
    pub async fn reconcile(db: &Surreal<Any>) -> Result<ReconcileReport> {
        let canonical: Vec<String> = db
            .query("SELECT VALUE record::id(id) FROM song")
            .await?
            .take(0)?;

        let embedded: Vec<Option<Vec<String>>> = db
            .query("SELECT VALUE songs.id FROM playlist")
            .await?
            .take(0)?;

        let canonical: BTreeSet<String> = canonical.into_iter().collect();
        let embedded: BTreeSet<String> = embedded.into_iter().flatten().flatten().collect();

        let orphaned_songs: Vec<String> = canonical.difference(&embedded).cloned().collect();
        let dangling_copies: Vec<String> = embedded.difference(&canonical).cloned().collect();

        let mut playlists_repaired = 0;
        for song_key in &dangling_copies {
            playlists_repaired += Self::pull_from_all_playlists(db, song_key).await?;
        }

        if !orphaned_songs.is_empty() || !dangling_copies.is_empty() {
            tracing::info!(
                orphaned = orphaned_songs.len(),
                dangling = dangling_copies.len(),
                playlists_repaired,
                "reconciled songs with playlists"
            );
        }

        Ok(ReconcileReport {
            orphaned_songs,
            dangling_copies,
            playlists_repaired,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use async_trait::async_trait;
    use surrealdb::engine::any::connect;

    use crate::{
        models::playlist::{CreatePlaylistRequest, Playlist},
        services::{playlist_service::PlaylistService, storage_service::SimulatedObjectStore},
    };

    const UNKNOWN_KEY: &str = "01HQ3Z8K9V4X7M2N5P6R8T0W1Y";

    async fn setup_db() -> Surreal<Any> {
        let db = connect("mem://").await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    async fn create_playlist(db: &Surreal<Any>, name: &str) -> Playlist {
        PlaylistService::create(
            db,
            CreatePlaylistRequest {
                user_id: "user123".to_string(),
                device_id: "device_abc".to_string(),
                name: name.to_string(),
                parent_id: None,
            },
        )
        .await
        .expect("Test playlist creation failed")
    }

    async fn fetch_playlist(db: &Surreal<Any>, id: &str) -> Playlist {
        PlaylistService::get(db, id)
            .await
            .unwrap()
            .found()
            .expect("playlist should exist")
    }

    fn new_song(playlist_id: &str, title: &str) -> NewSong {
        NewSong {
            playlist_id: playlist_id.to_string(),
            user_id: "user123".to_string(),
            device_id: "device_abc".to_string(),
            title: title.to_string(),
            artist: Some("The Band".to_string()),
            album: None,
            duration: Some(215),
        }
    }

    fn stored_object() -> StoredObject {
        StoredObject {
            file_id: "7d0b5c1e-2f9a-4c51-9a7e-0e8f2b6c4d11".to_string(),
            file_url: "https://cdn.example.com/users/user123/audio/7d0b5c1e.mp3".to_string(),
            storage_path: "users/user123/audio/7d0b5c1e.mp3".to_string(),
            file_size: 2048,
            content_type: Some("audio/mpeg".to_string()),
            original_filename: "track1.mp3".to_string(),
        }
    }

    /// Simulated store that counts uploads.
    struct CountingStore {
        inner: SimulatedObjectStore,
        stored: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: SimulatedObjectStore::new("https://cdn.example.com"),
                stored: AtomicUsize::new(0),
            }
        }

        fn uploads(&self) -> usize {
            self.stored.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn store(
            &self,
            payload: &[u8],
            owner_id: &str,
            filename: &str,
            content_type: Option<&str>,
        ) -> Result<StoredObject> {
            self.stored.fetch_add(1, Ordering::SeqCst);
            self.inner.store(payload, owner_id, filename, content_type).await
        }

        async fn delete(&self, storage_path: &str) -> Result<bool> {
            self.inner.delete(storage_path).await
        }
    }

    fn flac_upload() -> AudioUpload {
        AudioUpload {
            filename: "track1.flac".to_string(),
            content_type: Some("audio/flac".to_string()),
            bytes: vec![0u8; 1024],
        }
    }

    async fn count_songs(db: &Surreal<Any>) -> usize {
        let ids: Vec<String> = db
            .query("SELECT VALUE record::id(id) FROM song")
            .await
            .unwrap()
            .take(0)
            .unwrap();
        ids.len()
    }

    #[tokio::test]
    async fn test_create_and_attach() {
        let db = setup_db().await;
        let playlist = create_playlist(&db, "Rock").await;

        let song =
            SongService::create_and_attach(&db, new_song(&playlist.id, "Track1"), &stored_object())
                .await
                .unwrap();

        let playlist = fetch_playlist(&db, &playlist.id).await;
        assert_eq!(playlist.songs.len(), 1);
        assert_eq!(playlist.songs[0], song);

        let canonical = SongService::get(&db, &song.id)
            .await
            .unwrap()
            .found()
            .expect("canonical song should exist");
        assert_eq!(canonical.title, "Track1");
        assert_eq!(canonical.artist.as_deref(), Some("The Band"));
        assert_eq!(canonical.album, None);
        assert_eq!(canonical.duration, Some(215));
        assert_eq!(canonical.storage_path, "users/user123/audio/7d0b5c1e.mp3");
        assert_eq!(canonical.file_size, 2048);

        let native: Vec<bool> = db
            .query("SELECT VALUE type::is::datetime(created_at) FROM song")
            .await
            .unwrap()
            .take(0)
            .unwrap();
        assert_eq!(native, vec![true]);
    }

    #[tokio::test]
    async fn test_create_and_attach_validates_before_insert() {
        let db = setup_db().await;

        let missing =
            SongService::create_and_attach(&db, new_song(UNKNOWN_KEY, "Track1"), &stored_object())
                .await;
        assert!(matches!(
            missing,
            Err(Error::InvalidInput { reason }) if reason == "Playlist not found"
        ));

        let malformed =
            SongService::create_and_attach(&db, new_song("bogus", "Track1"), &stored_object())
                .await;
        assert!(matches!(
            malformed,
            Err(Error::InvalidInput { reason }) if reason == "Invalid playlist_id"
        ));

        assert_eq!(count_songs(&db).await, 0, "No orphan song may be inserted");
    }

    #[tokio::test]
    async fn test_upload_and_attach() {
        let db = setup_db().await;
        let store = SimulatedObjectStore::new("https://cdn.example.com");
        let playlist = create_playlist(&db, "Rock").await;

        let song = SongService::upload_and_attach(
            &db,
            &store,
            new_song(&playlist.id, "Track1"),
            flac_upload(),
        )
        .await
        .unwrap();

        assert_eq!(song.file_size, 1024);
        assert_eq!(song.original_filename, "track1.flac");
        assert!(song.storage_path.starts_with("users/user123/audio/"));
        assert!(song.storage_path.ends_with(".flac"));
        assert_eq!(
            song.file_url,
            format!("https://cdn.example.com/{}", song.storage_path)
        );
        assert_eq!(fetch_playlist(&db, &playlist.id).await.songs, vec![song]);
    }

    #[tokio::test]
    async fn test_rejected_upload_stores_nothing() {
        let db = setup_db().await;
        let store = CountingStore::new();

        let missing =
            SongService::upload_and_attach(&db, &store, new_song(UNKNOWN_KEY, "T"), flac_upload())
                .await;
        assert!(matches!(
            missing,
            Err(Error::InvalidInput { reason }) if reason == "Playlist not found"
        ));

        let malformed =
            SongService::upload_and_attach(&db, &store, new_song("bogus", "T"), flac_upload())
                .await;
        assert!(matches!(malformed, Err(Error::InvalidInput { .. })));

        let playlist = create_playlist(&db, "Rock").await;
        let blank =
            SongService::upload_and_attach(&db, &store, new_song(&playlist.id, " "), flac_upload())
                .await;
        assert!(matches!(blank, Err(Error::InvalidInput { .. })));

        assert_eq!(store.uploads(), 0);
        assert_eq!(count_songs(&db).await, 0);

        SongService::upload_and_attach(&db, &store, new_song(&playlist.id, "T"), flac_upload())
            .await
            .unwrap();
        assert_eq!(store.uploads(), 1);
    }

    #[tokio::test]
    async fn test_attach_to_vanished_playlist_keeps_canonical_song() {
        let db = setup_db().await;
        let rock = create_playlist(&db, "Rock").await;

        let song =
            SongService::insert_canonical(&db, new_song(&rock.id, "Track1"), &stored_object())
                .await
                .unwrap();

        // Playlist removed between the existence check and the push
        assert!(PlaylistService::delete(&db, &rock.id).await.unwrap());

        match SongService::attach(&db, &rock.id, song.clone()).await {
            Err(Error::AttachFail {
                song_id,
                playlist_id,
                ..
            }) => {
                assert_eq!(song_id, song.id);
                assert_eq!(playlist_id, rock.id);
            }
            other => panic!("expected AttachFail, got {:?}", other),
        }

        assert_eq!(
            SongService::get(&db, &song.id).await.unwrap(),
            Lookup::Found(song.clone())
        );

        let report = SongService::reconcile(&db).await.unwrap();
        assert_eq!(report.orphaned_songs, vec![song.id]);
        assert!(report.dangling_copies.is_empty());
    }

    #[tokio::test]
    async fn test_get_with_invalid_id_is_not_found() {
        let db = setup_db().await;

        assert_eq!(SongService::get(&db, "nope").await.unwrap(), Lookup::NotFound);
        assert_eq!(SongService::get(&db, UNKNOWN_KEY).await.unwrap(), Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_remove_from_playlist() {
        let db = setup_db().await;
        let rock = create_playlist(&db, "Rock").await;
        let jazz = create_playlist(&db, "Jazz").await;

        let song =
            SongService::create_and_attach(&db, new_song(&rock.id, "Track1"), &stored_object())
                .await
                .unwrap();

        // Jazz does not hold the song
        let removed = SongService::remove_from_playlist(&db, &song.id, &jazz.id)
            .await
            .unwrap();
        assert!(!removed);
        assert_eq!(fetch_playlist(&db, &jazz.id).await, jazz);
        assert_eq!(fetch_playlist(&db, &rock.id).await.songs.len(), 1);

        let removed = SongService::remove_from_playlist(&db, &song.id, &rock.id)
            .await
            .unwrap();
        assert!(removed);
        assert!(fetch_playlist(&db, &rock.id).await.songs.is_empty());

        // Canonical record untouched
        assert!(SongService::get(&db, &song.id).await.unwrap().found().is_some());

        let removed = SongService::remove_from_playlist(&db, &song.id, &rock.id)
            .await
            .unwrap();
        assert!(!removed, "Second removal modifies nothing");
        assert!(!SongService::remove_from_playlist(&db, &song.id, "bad").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_every_copy() {
        let db = setup_db().await;
        let rock = create_playlist(&db, "Rock").await;
        let favorites = create_playlist(&db, "Favorites").await;

        let song =
            SongService::create_and_attach(&db, new_song(&rock.id, "Track1"), &stored_object())
                .await
                .unwrap();
        let keeper =
            SongService::create_and_attach(&db, new_song(&rock.id, "Track2"), &stored_object())
                .await
                .unwrap();

        // Second copy of the same song elsewhere
        assert!(SongService::embed_copy(&db, &favorites.id, &song).await.unwrap());

        assert!(SongService::delete(&db, &song.id).await.unwrap());

        assert_eq!(SongService::get(&db, &song.id).await.unwrap(), Lookup::NotFound);
        assert_eq!(count_songs(&db).await, 1);

        let rock = fetch_playlist(&db, &rock.id).await;
        assert_eq!(rock.songs, vec![keeper]);
        assert!(fetch_playlist(&db, &favorites.id).await.songs.is_empty());

        assert!(!SongService::delete(&db, &song.id).await.unwrap());
        assert!(!SongService::delete(&db, "garbage").await.unwrap());
    }

    #[tokio::test]
    async fn test_reconcile() {
        let db = setup_db().await;
        let rock = create_playlist(&db, "Rock").await;

        let attached =
            SongService::create_and_attach(&db, new_song(&rock.id, "Attached"), &stored_object())
                .await
                .unwrap();
        let detached =
            SongService::create_and_attach(&db, new_song(&rock.id, "Detached"), &stored_object())
                .await
                .unwrap();
        let vanished =
            SongService::create_and_attach(&db, new_song(&rock.id, "Vanished"), &stored_object())
                .await
                .unwrap();

        assert!(SongService::remove_from_playlist(&db, &detached.id, &rock.id)
            .await
            .unwrap());

        // Canonical record gone while its copy stays behind
        let _: Vec<IgnoredAny> = db
            .query("DELETE song WHERE id = $song RETURN BEFORE")
            .bind(("song", create_song_thing(&vanished.id)))
            .await
            .unwrap()
            .take(0)
            .unwrap();

        let report = SongService::reconcile(&db).await.unwrap();
        assert_eq!(report.orphaned_songs, vec![detached.id.clone()]);
        assert_eq!(report.dangling_copies, vec![vanished.id.clone()]);
        assert_eq!(report.playlists_repaired, 1);

        let rock = fetch_playlist(&db, &rock.id).await;
        assert_eq!(rock.songs, vec![attached]);

        let second_pass = SongService::reconcile(&db).await.unwrap();
        assert!(second_pass.dangling_copies.is_empty());
        assert_eq!(second_pass.playlists_repaired, 0);
    }
}
