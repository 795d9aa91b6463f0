use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::info;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use crate::model::Album;
use super::DbConnector;
use super::super::{CreatedAlbum, DbError};

pub const DRIVER_NAME: &str = "memory";

#[derive(Debug, Deserialize)]
struct Fixtures {
    albums: Vec<Album>,
}

/// Process-lifetime album list. Ids are whatever the caller sent, duplicates
/// included.
pub struct MemoryStore {
    albums: Mutex<Vec<Album>>,
}

impl MemoryStore {
    pub fn new(albums: Vec<Album>) -> MemoryStore {
        MemoryStore {
            albums: Mutex::new(albums),
        }
    }

    /// `memory:` starts empty; `memory:///<path>` seeds from a fixtures file
    /// relative to the working directory.
    pub fn open(url: &Url) -> Result<MemoryStore, DbError> {
        let path = match fixtures_path(url)? {
            Some(path) => path,
            None => return Ok(MemoryStore::new(Vec::new())),
        };

        let fixtures = load_fixtures(&path)?;
        info!("seeded {} albums from {}", fixtures.albums.len(), path.display());
        Ok(MemoryStore::new(fixtures.albums))
    }

    pub fn lock(&self) -> Result<MemoryConnector<'_>, DbError> {
        let albums = self.albums.lock().map_err(|_| DbError::Poisoned)?;
        Ok(MemoryConnector { albums })
    }
}

fn fixtures_path(url: &Url) -> Result<Option<PathBuf>, DbError> {
    let decoded = percent_decode_str(url.path()).decode_utf8()?;
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() {
        return Ok(None);
    }
    Ok(Some(Path::new(".").join(relative)))
}

fn load_fixtures(path: &Path) -> Result<Fixtures, DbError> {
    let db_json = File::open(path)?;
    let fixtures = serde_json::from_reader(BufReader::new(db_json))?;
    Ok(fixtures)
}

pub struct MemoryConnector<'a> {
    albums: MutexGuard<'a, Vec<Album>>,
}

impl<'a> DbConnector for MemoryConnector<'a> {
    fn ping(&mut self) -> Result<(), DbError> {
        Ok(())
    }

    fn get_albums(&mut self) -> Result<Vec<Album>, DbError> {
        Ok(self.albums.to_vec())
    }

    fn get_album(&mut self, id: &str) -> Result<Option<Album>, DbError> {
        Ok(self.albums.iter().find(|a| a.id == id).cloned())
    }

    fn create_album(&mut self, album: &Album) -> Result<CreatedAlbum, DbError> {
        self.albums.push(album.clone());
        Ok(CreatedAlbum::Album(album.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn album(id: &str, title: &str) -> Album {
        Album {
            id: id.into(),
            title: title.into(),
            artist: "Gerry Mulligan".into(),
            price: 17.99,
        }
    }

    #[test]
    fn lists_in_insertion_order() {
        let store = MemoryStore::new(Vec::new());
        let mut conn = store.lock().unwrap();
        assert!(conn.get_albums().unwrap().is_empty());

        conn.create_album(&album("2", "Jeru")).unwrap();
        conn.create_album(&album("1", "Nightlights")).unwrap();

        let ids: Vec<_> = conn.get_albums().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn insert_echoes_and_round_trips() {
        let store = MemoryStore::new(Vec::new());
        let mut conn = store.lock().unwrap();

        let jeru = album("2", "Jeru");
        assert_eq!(conn.create_album(&jeru).unwrap(), CreatedAlbum::Album(jeru.clone()));
        assert_eq!(conn.get_album("2").unwrap(), Some(jeru));
    }

    #[test]
    fn duplicate_ids_are_kept_and_first_wins() {
        let store = MemoryStore::new(vec![album("7", "first")]);
        let mut conn = store.lock().unwrap();
        conn.create_album(&album("7", "second")).unwrap();

        assert_eq!(conn.get_albums().unwrap().len(), 2);
        assert_eq!(conn.get_album("7").unwrap().unwrap().title, "first");
    }

    #[test]
    fn lookup_is_exact() {
        let store = MemoryStore::new(vec![album("07", "Jeru")]);
        let mut conn = store.lock().unwrap();
        assert_eq!(conn.get_album("7").unwrap(), None);
        assert_eq!(conn.get_album("07 ").unwrap(), None);
    }

    #[test]
    fn opens_empty_without_path() {
        for raw in ["memory:", "memory://", "memory:///"] {
            let store = MemoryStore::open(&Url::parse(raw).unwrap()).unwrap();
            assert!(store.lock().unwrap().get_albums().unwrap().is_empty(), "{}", raw);
        }
    }

    #[test]
    fn seeds_from_bundled_fixtures() {
        let url = Url::parse("memory:///fixtures/albums.json").unwrap();
        let store = MemoryStore::open(&url).unwrap();

        let mut conn = store.lock().unwrap();
        assert_eq!(conn.get_albums().unwrap().len(), 3);
        assert_eq!(conn.get_album("3").unwrap().unwrap().artist, "Sarah Vaughan");
    }

    #[test]
    fn fixture_paths_are_relative_and_decoded() {
        let url = Url::parse("memory:///fixtures/my%20albums.json").unwrap();
        assert_eq!(fixtures_path(&url).unwrap(), Some(Path::new("./fixtures/my albums.json").to_path_buf()));

        let url = Url::parse("memory:fixtures/albums.json").unwrap();
        assert_eq!(fixtures_path(&url).unwrap(), Some(Path::new("./fixtures/albums.json").to_path_buf()));
    }

    #[test]
    fn seeds_from_path_with_space() {
        let dir = tempfile::Builder::new().tempdir_in(".").unwrap();
        let dir_name = dir.path().file_name().unwrap().to_str().unwrap().to_owned();
        let mut file = File::create(dir.path().join("my albums.json")).unwrap();
        write!(file, r#"{{"albums": [
            {{"id": "2", "title": "Jeru", "artist": "Gerry Mulligan", "price": 17.99}}
        ]}}"#).unwrap();

        let url = Url::parse(&format!("memory:///{}/my%20albums.json", dir_name)).unwrap();
        let store = MemoryStore::open(&url).unwrap();
        assert_eq!(store.lock().unwrap().get_album("2").unwrap().unwrap().title, "Jeru");
    }

    #[test]
    fn missing_fixtures_fail() {
        let url = Url::parse("memory:///does/not/exist.json").unwrap();
        assert!(matches!(MemoryStore::open(&url), Err(DbError::Io(_))));
    }
}
