use ::postgres::{Client, NoTls, Row};

use crate::model::Album;
use super::DbConnector;
use super::super::{CreatedAlbum, DbError};

pub const DRIVER_NAME: &str = "postgresql";
pub const DRIVER_ALIAS: &str = "postgres";

// price is read back as float8 whatever its column type (DECIMAL in most
// recordings schemas), and the id is always widened to bigint.
const SELECT_ALBUMS: &str = "
    SELECT a.id::bigint, a.title, a.artist, a.price::float8
    FROM album AS a
";

const SELECT_ALBUM_BY_ID: &str = "
    SELECT a.id::bigint, a.title, a.artist, a.price::float8
    FROM album AS a
    WHERE a.id::text = $1
";

const INSERT_ALBUM: &str = "
    INSERT INTO album (title, artist, price)
    VALUES ($1, $2, $3::float8)
    RETURNING id::bigint
";

pub struct PostgresConnector {
    pgconn: Client,
}

impl PostgresConnector {
    pub fn connect(dburl: &str) -> Result<PostgresConnector, DbError> {
        let pgconn = Client::connect(dburl, NoTls)?;

        Ok(PostgresConnector {
            pgconn,
        })
    }
}

impl DbConnector for PostgresConnector {
    fn ping(&mut self) -> Result<(), DbError> {
        self.pgconn.batch_execute("SELECT 1")?;
        Ok(())
    }

    fn get_albums(&mut self) -> Result<Vec<Album>, DbError> {
        let rows = self.pgconn.query(SELECT_ALBUMS, &[])?;
        rows.iter().map(album_from_row).collect()
    }

    fn get_album(&mut self, id: &str) -> Result<Option<Album>, DbError> {
        let row = self.pgconn.query_opt(SELECT_ALBUM_BY_ID, &[&id])?;
        row.as_ref().map(album_from_row).transpose()
    }

    fn create_album(&mut self, album: &Album) -> Result<CreatedAlbum, DbError> {
        let row = self.pgconn.query_one(INSERT_ALBUM, &[&album.title, &album.artist, &album.price])?;
        Ok(CreatedAlbum::Id(row.try_get(0)?))
    }
}

fn album_from_row(row: &Row) -> Result<Album, DbError> {
    let id: i64 = row.try_get(0)?;
    Ok(Album {
        id: id.to_string(),
        title: row.try_get(1)?,
        artist: row.try_get(2)?,
        price: row.try_get(3)?,
    })
}
