use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub price: f64,
}

impl Album {
    /// The row inserted by `POST /albums` on a relational store when the
    /// request body is not bound.
    pub fn placeholder() -> Album {
        Album {
            id: String::new(),
            title: "The Modern Sound of Betty Carter".into(),
            artist: "Betty Carter".into(),
            price: 49.99,
        }
    }
}
