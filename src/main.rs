#[macro_use] extern crate rocket;

use std::io::Cursor;

use log::{error, info};
use rocket::{Build, Request, Response, Rocket, State};
use rocket::data::{ByteUnit, Data, Limits};
use rocket::fairing::AdHoc;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use serde::Serialize;
use thiserror::Error;

mod config;
mod database;
mod model;
mod rpc;

use self::config::{AppConfig, ConfigError};
use self::database::{Database, DbError};
use self::model::Album;

const ENABLE_CORS: bool = true;

#[derive(Debug, Error)]
enum ApiError {
    #[error("album not found")]
    NotFound,

    #[error("{0}")]
    Binding(String),

    #[error("album body exceeds {0}")]
    TooLarge(ByteUnit),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = match self {
            ApiError::NotFound => {
                let message = rpc::MessageResponse { message: self.to_string() };
                return wrap_json(Status::NotFound, &message).respond_to(req);
            }
            ApiError::Binding(_) => Status::BadRequest,
            ApiError::TooLarge(_) => Status::PayloadTooLarge,
            ApiError::Store(ref err) => {
                error!("store error: {}", err);
                Status::InternalServerError
            }
        };
        wrap_json(status, &rpc::ErrorResponse { error: self.to_string() }).respond_to(req)
    }
}

#[options("/albums")]
fn albums_options() -> CorsPreflight {
    CorsPreflight
}

#[options("/albums/<_>")]
fn album_options() -> CorsPreflight {
    CorsPreflight
}

#[get("/albums")]
async fn albums_get(db: &State<Database>) -> Result<JsonReply, ApiError> {
    let albums = db.run(|conn| conn.get_albums()).await?;
    Ok(wrap_json(Status::Ok, &albums))
}

#[get("/albums/<id>")]
async fn album_get(db: &State<Database>, id: String) -> Result<JsonReply, ApiError> {
    let album = db.run(move |conn| conn.get_album(&id)).await?
        .ok_or(ApiError::NotFound)?;
    Ok(wrap_json(Status::Ok, &album))
}

#[post("/albums", data = "<body>")]
async fn albums_post(
    config: &State<AppConfig>,
    db: &State<Database>,
    limits: &Limits,
    body: Data<'_>,
) -> Result<JsonReply, ApiError> {
    let album = if binds_body(db.assigns_ids(), config.database.bind_create_body) {
        let limit = limits.get("json").unwrap_or(Limits::JSON);
        let bytes = body.open(limit).into_bytes().await
            .map_err(|e| ApiError::Binding(e.to_string()))?;
        if !bytes.is_complete() {
            return Err(ApiError::TooLarge(limit));
        }
        bind_album(&bytes)?
    } else {
        Album::placeholder()
    };
    let created = db.run(move |conn| conn.create_album(&album)).await?;
    Ok(wrap_json(Status::Created, &rpc::AlbumCreateResponse::from(created)))
}

/// Stores that generate ids get the placeholder album unless body binding
/// is switched on. The body is never read in that case.
fn binds_body(assigns_ids: bool, bind_create_body: bool) -> bool {
    !assigns_ids || bind_create_body
}

fn bind_album(body: &[u8]) -> Result<Album, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Binding(e.to_string()))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> JsonReply {
    wrap_json(status, &rpc::ErrorResponse {
        error: status.reason_lossy().to_owned(),
    })
}

struct CorsPreflight;

impl<'r> Responder<'r, 'static> for CorsPreflight {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let mut builder = Response::build();
        cors_headers(&mut builder);
        builder.ok()
    }
}

struct JsonReply {
    status: Status,
    body: Vec<u8>,
}

impl<'r> Responder<'r, 'static> for JsonReply {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let mut builder = Response::build();
        builder.status(self.status);
        builder.header(ContentType::JSON);
        cors_headers(&mut builder);
        builder.sized_body(self.body.len(), Cursor::new(self.body));
        builder.ok()
    }
}

fn cors_headers(builder: &mut response::Builder<'_>) {
    if ENABLE_CORS {
        builder.raw_header("Access-Control-Allow-Origin", "*");
        builder.raw_header("Access-Control-Allow-Methods", "GET, POST");
        builder.raw_header("Access-Control-Allow-Headers", "Content-Type");
    }
}

// indented, like the rest of the api
fn wrap_json<T: Serialize>(status: Status, ser: &T) -> JsonReply {
    match serde_json::to_vec_pretty(ser) {
        Ok(body) => JsonReply { status, body },
        Err(err) => {
            error!("error serializing response: {}", err);
            JsonReply {
                status: Status::InternalServerError,
                body: Vec::new(),
            }
        }
    }
}

fn build_rocket(app: AppConfig, db: Database) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", app.web.address))
        .merge(("port", app.web.port));

    let ping_db = db.clone();
    rocket::custom(figment)
        .mount("/", routes![
            albums_get,
            albums_options,
            albums_post,
            album_get,
            album_options,
        ])
        .register("/", catchers![default_catcher])
        .attach(AdHoc::try_on_ignite("Album store ping", move |rocket| async move {
            match ping_db.run(|conn| conn.ping()).await {
                Ok(()) => {
                    info!("Connected!");
                    Ok(rocket)
                }
                Err(err) => {
                    error!("PING: {}", err);
                    Err(rocket)
                }
            }
        }))
        .manage(app)
        .manage(db)
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Launch(#[from] rocket::Error),
}

#[rocket::main]
async fn main() -> Result<(), StartupError> {
    let config_file = std::env::args_os().nth(1);
    let app = AppConfig::load(config_file.as_deref())?;
    let db = Database::open(&app.database.url()?)?;

    let _rocket = build_rocket(app, db).launch().await?;
    Ok(())
}
