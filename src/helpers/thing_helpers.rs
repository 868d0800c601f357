use lazy_regex::regex_is_match;
use surrealdb::sql::Thing;

pub const PLAYLIST_TABLE: &str = "playlist";
pub const SONG_TABLE: &str = "song";

/// Parse un ID depuis différents formats possibles (`tb:id` ou `id`)
pub fn parse_id_part(id: &str) -> &str {
    if let Some(id_part) = id.split(':').nth(1) {
        id_part
    } else {
        id
    }
}

/// Les clés sont générées par la base avec `ulid()`
pub fn is_valid_record_key(key: &str) -> bool {
    regex_is_match!(r"^[0-9A-HJKMNP-TV-Z]{26}$", key)
}

/// Valide `raw` pour la table `table` et renvoie la clé seule.
/// Accepte `clé` ou `table:clé`.
pub fn parse_record_key<'a>(table: &str, raw: &'a str) -> Option<&'a str> {
    let raw = raw.trim();
    let key = match raw.split_once(':') {
        Some((tb, key)) if tb == table => key,
        Some(_) => return None,
        None => raw,
    };

    is_valid_record_key(key).then_some(key)
}

/// Crée un Thing pour une chanson
pub fn create_song_thing(song_id: &str) -> Thing {
    let clean_id = parse_id_part(song_id);
    Thing::from((SONG_TABLE.to_string(), clean_id.to_string()))
}

/// Crée un Thing pour une playlist
pub fn create_playlist_thing(playlist_id: &str) -> Thing {
    let clean_id = parse_id_part(playlist_id);
    Thing::from((PLAYLIST_TABLE.to_string(), clean_id.to_string()))
}
