//! REST API for semdb.
//!
//! Exposes the document store over HTTP with JSON endpoints. The active
//! backend is created once at startup, shared with the request handlers
//! behind a reader-writer lock, and flushed to durable storage when the
//! server shuts down. Inserts take the writer side of the lock so a search
//! can never observe a half-appended document; searches run concurrently
//! under the reader side.
//!
//! ## Endpoints
//!
//! - `POST /add-doc` - Embed a document's text and insert it
//! - `POST /search` - Embed a query and return the nearest documents
//!
//! ## Usage
//!
//! ```rust,no_run
//! use semdb::config::Config;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     semdb::server::run(Config::default()).await
//! }
//! ```

use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::StoreError;
use crate::store::{self, Store};

/// Shared per-process state handed to every request handler.
pub struct AppState {
    pub store: RwLock<Store>,
    pub embedder: Embedder,
}

// --- Request structs ---

#[derive(Deserialize)]
struct DocInput {
    doc_id: i64,
    text: String,
}

#[derive(Deserialize)]
struct QueryInput {
    text: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    5
}

// --- Response structs ---

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Serialize)]
struct SearchResult {
    doc_id: i64,
    text: String,
}

// --- Handlers ---

async fn add_doc_handler(state: web::Data<AppState>, body: web::Json<DocInput>) -> impl Responder {
    let vector = state.embedder.embed(&body.text).await;

    let mut store = state.store.write().await;
    match store.insert(&vector, body.doc_id, body.text.clone()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"status": "ok"})),
        Err(error @ StoreError::DimensionMismatch { .. }) => {
            HttpResponse::BadRequest().json(serde_json::json!({"error": error.to_string()}))
        }
        Err(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({"error": error.to_string()}))
        }
    }
}

async fn search_handler(state: web::Data<AppState>, body: web::Json<QueryInput>) -> impl Responder {
    // Lazily materialize persisted state on the first query after a
    // restart. Double-checked under the writer lock so concurrent first
    // queries load at most once.
    if state.store.read().await.needs_load() {
        let mut store = state.store.write().await;
        if store.needs_load() {
            if let Err(e) = store.load().await {
                error!(error = %e, "failed to load persisted index");
                return HttpResponse::InternalServerError()
                    .json(serde_json::json!({"error": e.to_string()}));
            }
        }
    }

    let vector = state.embedder.embed(&body.text).await;

    let store = state.store.read().await;
    match store.search(&vector, body.top_k).await {
        Ok(hits) => {
            let results = hits.into_iter()
                .map(|hit| SearchResult { doc_id: hit.id, text: hit.text })
                .collect();
            HttpResponse::Ok().json(SearchResponse { results })
        }
        Err(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({"error": error.to_string()}))
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/add-doc").route(web::post().to(add_doc_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)));
}

/// Runs the server until shutdown, then flushes the backend.
///
/// The backend is selected once here; an invalid selector was already
/// rejected while parsing the configuration.
pub async fn run(config: Config) -> std::io::Result<()> {
    let store = store::create_store(&config.store);
    let state = web::Data::new(AppState {
        store: RwLock::new(store),
        embedder: Embedder::new(&config.embedding),
    });

    info!(host = %config.host, port = config.port, "starting server");

    let app_state = state.clone();
    HttpServer::new(move || App::new().app_data(app_state.clone()).configure(routes))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    shutdown(&state).await;
    Ok(())
}

/// Flushes the active backend before the process exits.
pub async fn shutdown(state: &web::Data<AppState>) {
    match state.store.read().await.save().await {
        Ok(()) => info!("index flushed to storage"),
        Err(StoreError::PersistenceUnsupported(backend)) => {
            info!(backend, "backend is ephemeral, nothing to flush");
        }
        Err(error) => warn!(error = %error, "failed to flush index on shutdown"),
    }
}
