use serde::Serialize;

mod album;
pub use self::album::AlbumCreateResponse;

// {"error": "database error: ..."}
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

// {"message": "album not found"}
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
