use surrealdb::{
    engine::any::{self, Any},
    opt::auth::Root,
    Surreal,
};

use crate::{config::DbConfig, Result};

/// Opens the shared store handle. Called once at startup; the handle is then
/// cloned into `AppState` and passed to every service call.
pub async fn connect(config: &DbConfig) -> Result<Surreal<Any>> {
    tracing::info!("Connecting to database at: {}", config.url);

    let db = any::connect(&config.url).await?;

    if let Some(credentials) = &config.credentials {
        db.signin(Root {
            username: &credentials.username,
            password: &credentials.password,
        })
        .await?;
    }

    db.use_ns(&config.namespace).use_db(&config.database).await?;

    tracing::info!("Database connected successfully!");

    Ok(db)
}

/// Store reachability probe used by the health endpoint.
pub async fn ping(db: &Surreal<Any>) -> bool {
    db.health().await.is_ok()
}

pub fn close(db: Surreal<Any>) {
    drop(db);
    tracing::info!("Closed database connection");
}
