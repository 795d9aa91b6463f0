use serde::Serialize;

use crate::database::CreatedAlbum;
use crate::model::Album;

/// Body of a `201 Created`: the bare generated id, or the stored album.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum AlbumCreateResponse {
    Id(i64),
    Album(Album),
}

impl From<CreatedAlbum> for AlbumCreateResponse {
    fn from(created: CreatedAlbum) -> AlbumCreateResponse {
        match created {
            CreatedAlbum::Id(id) => AlbumCreateResponse::Id(id),
            CreatedAlbum::Album(album) => AlbumCreateResponse::Album(album),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_is_not_wrapped() {
        let body = serde_json::to_string(&AlbumCreateResponse::from(CreatedAlbum::Id(5))).unwrap();
        assert_eq!(body, "5");
    }

    #[test]
    fn echoed_album_is_an_object() {
        let album = Album {
            id: "4".into(),
            title: "X".into(),
            artist: "Y".into(),
            price: 9.99,
        };
        let body = serde_json::to_value(AlbumCreateResponse::from(CreatedAlbum::Album(album))).unwrap();
        assert_eq!(body, serde_json::json!({"id": "4", "title": "X", "artist": "Y", "price": 9.99}));
    }
}
