use std::sync::Arc;

use log::info;
use rocket::tokio::task;
use url::Url;

use crate::model::Album;
use super::{CreatedAlbum, DbError};

pub mod postgres;
pub mod memory;

pub trait DbConnector {
    fn ping(&mut self) -> Result<(), DbError>;

    fn get_albums(&mut self) -> Result<Vec<Album>, DbError>;

    /// Exact string match on `id`. `Ok(None)` means no such album.
    fn get_album(&mut self, id: &str) -> Result<Option<Album>, DbError>;

    fn create_album(&mut self, album: &Album) -> Result<CreatedAlbum, DbError>;
}

/// Handle to the configured album store, shared by all requests.
///
/// A connector is acquired per operation with [`Database::connect`] and
/// released when it is dropped: a fresh client for postgres, the list lock
/// for the in-memory store.
#[derive(Clone)]
pub enum Database {
    Postgres(Arc<str>),
    Memory(Arc<memory::MemoryStore>),
}

impl Database {
    pub fn open(url_raw: &str) -> Result<Database, DbError> {
        let url = Url::parse(url_raw)?;

        info!("getting driver {}", url.scheme());
        match url.scheme() {
            postgres::DRIVER_NAME | postgres::DRIVER_ALIAS => Ok(Database::Postgres(url_raw.into())),
            memory::DRIVER_NAME => Ok(Database::Memory(Arc::new(memory::MemoryStore::open(&url)?))),
            scheme => Err(DbError::UnknownScheme(scheme.to_owned())),
        }
    }

    /// Whether the store generates album ids on insert.
    pub fn assigns_ids(&self) -> bool {
        match *self {
            Database::Postgres(_) => true,
            Database::Memory(_) => false,
        }
    }

    pub fn connect(&self) -> Result<Box<dyn DbConnector + '_>, DbError> {
        match *self {
            Database::Postgres(ref url) => Ok(Box::new(postgres::PostgresConnector::connect(url)?)),
            Database::Memory(ref store) => Ok(Box::new(store.lock()?)),
        }
    }

    /// Runs `op` against a freshly acquired connector on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, DbError>
        where F: FnOnce(&mut dyn DbConnector) -> Result<T, DbError> + Send + 'static,
              T: Send + 'static
    {
        let db = self.clone();
        task::spawn_blocking(move || {
            let mut conn = db.connect()?;
            op(&mut *conn)
        }).await?
    }
}
