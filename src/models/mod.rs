pub mod lookup;
pub mod playlist;
pub mod song;

pub mod database_helpers;
