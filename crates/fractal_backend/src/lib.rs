mod accounts;
mod env;
mod services;
mod sqlite_store;
mod subscriptions;
mod time;

pub use accounts::{Account, normalize_email};
pub use env::{FRACTAL_DB_PATH_ENV, resolve_db_path};
pub use sqlite_store::SqliteStore;
