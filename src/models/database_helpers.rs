/// Row shape for queries projecting `record::id(id) AS id`.
#[derive(serde::Deserialize)]
pub struct RecordKey {
    pub id: String,
}
