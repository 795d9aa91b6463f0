use std::error::Error as _;
use std::io;
use std::str::Utf8Error;

use rocket::tokio::task::JoinError;
use thiserror::Error;

use crate::model::Album;

pub mod drivers;

pub use self::drivers::Database;

/// Any failure while reaching or querying the album store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {}", postgres_cause(.0))]
    Postgres(#[from] postgres::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("error reading fixtures: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid fixtures path: {0}")]
    FixturesPath(#[from] Utf8Error),

    #[error("error parsing url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("album store lock poisoned")]
    Poisoned,

    #[error("database worker failed: {0}")]
    Worker(#[from] JoinError),
}

// postgres::Error only says "db error"; the server message or the
// underlying io error is what callers need to see.
fn postgres_cause(err: &postgres::Error) -> String {
    if let Some(db) = err.as_db_error() {
        return format!("{}: {}", err, db);
    }
    match err.source() {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}

/// What an insert hands back. Relational stores generate the id, the
/// in-memory store keeps the caller's album as-is.
#[derive(Debug, PartialEq, Clone)]
pub enum CreatedAlbum {
    Id(i64),
    Album(Album),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn postgres_errors_keep_their_cause() {
        let err = postgres::Client::connect("postgresql://nobody@127.0.0.1:1/recordings", postgres::NoTls)
            .err()
            .unwrap();
        let cause = err.source().unwrap().to_string();

        let msg = DbError::from(err).to_string();
        assert!(msg.starts_with("database error: "), "{}", msg);
        assert!(msg.ends_with(&cause), "{}", msg);
    }
}
