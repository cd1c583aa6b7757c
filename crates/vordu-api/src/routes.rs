//! HTTP routes
//!
//! | method | path | auth |
//! |--------|------|------|
//! | GET | `/health` | no |
//! | POST | `/config/ingest` | yes |
//! | POST | `/ingest` | yes |
//! | GET | `/matrix` | no |
//! | GET | `/config` | no |
//! | DELETE | `/admin/db` | yes |
//! | GET | anything else | no, dashboard files |

use crate::auth::require_api_key;
use crate::config::ServerConfig;
use crate::error::{handle_rejection, ApiError, StoreError};
use crate::store::MatrixStore;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use vordu_core::{ConfigPayload, CoreError, MatrixCell};
use warp::path::Peek;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Body of `GET /health`
pub const HEALTH_MESSAGE: &str = "Vörðu API is running. The Cairn stands tall.";
/// Served in place of the dashboard when `ui_dir` has no build
pub const UI_NOT_BUILT_MESSAGE: &str = "UI not built. Run 'npm run build' in ui/ directory.";

/// Path prefixes never handed to the dashboard fallback
const RESERVED_PREFIXES: [&str; 3] = ["api", "docs", "openapi.json"];

/// Store handle shared by every handler
pub type SharedStore = Arc<dyn MatrixStore>;

fn reject(err: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(err.into())
}

/// Run a store call on the blocking pool
async fn blocking<F, R>(f: F) -> Result<R, Rejection>
where
    F: FnOnce() -> Result<R, StoreError> + Send + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(reject),
        Err(e) => Err(reject(StoreError::Join(e.to_string()))),
    }
}

fn with_store(
    store: SharedStore,
) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn invalid_item(index: usize, err: CoreError) -> ApiError {
    match ApiError::from(err) {
        ApiError::InvalidPayload(message) => {
            ApiError::InvalidPayload(format!("item {index}: {message}"))
        }
        other => other,
    }
}

mod handlers {
    use super::*;

    pub(super) async fn ingest_config(
        payload: ConfigPayload,
        store: SharedStore,
    ) -> Result<impl Reply, Rejection> {
        let (system, components) = payload.into_parts().map_err(reject)?;
        let name = system.name.clone();
        let count = components.len();

        blocking(move || store.upsert_config(&system, &components)).await?;
        tracing::info!(system = %name, components = count, "Config ingested");
        Ok(warp::reply::json(
            &json!({ "status": "config_updated", "system": name }),
        ))
    }

    pub(super) async fn ingest_status(
        cells: Vec<MatrixCell>,
        store: SharedStore,
    ) -> Result<impl Reply, Rejection> {
        // nothing is written unless every item is valid
        for (index, cell) in cells.iter().enumerate() {
            cell.validate().map_err(|e| reject(invalid_item(index, e)))?;
        }

        let count = blocking(move || store.upsert_cells(&cells)).await?;
        tracing::info!(count, "Status ingested");
        Ok(warp::reply::json(&json!({ "status": "updated", "count": count })))
    }

    pub(super) async fn list_matrix(store: SharedStore) -> Result<impl Reply, Rejection> {
        let cells = blocking(move || store.list_cells()).await?;
        Ok(warp::reply::json(&cells))
    }

    pub(super) async fn list_config(store: SharedStore) -> Result<impl Reply, Rejection> {
        let systems = blocking(move || store.list_systems()).await?;
        Ok(warp::reply::json(&systems))
    }

    pub(super) async fn reset(store: SharedStore) -> Result<impl Reply, Rejection> {
        blocking(move || store.reset()).await?;
        Ok(warp::reply::json(&json!({ "status": "database_reset" })))
    }

    pub(super) async fn reserved_guard(path: Peek) -> Result<(), Rejection> {
        let path = path.as_str().trim_start_matches('/');
        if RESERVED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return Err(reject(ApiError::NotFound));
        }
        Ok(())
    }
}

/// Dashboard files with single-page-app fallback
///
/// Existing files under `ui_dir` are served as-is, any other path gets
/// `index.html`, and without a build a JSON notice is returned.
pub fn spa(ui_dir: PathBuf) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let index = ui_dir.join("index.html");
    let not_built =
        warp::any().map(|| warp::reply::json(&json!({ "message": UI_NOT_BUILT_MESSAGE })));

    warp::get()
        .and(warp::path::peek())
        .and_then(handlers::reserved_guard)
        .untuple_one()
        .and(
            warp::fs::dir(ui_dir)
                .or(warp::fs::file(index))
                .unify()
                .map(Reply::into_response)
                .or(not_built.map(Reply::into_response))
                .unify(),
        )
}

/// API routes without CORS, logging or rejection handling
pub fn api(
    store: SharedStore,
    api_key: Option<Arc<str>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let auth = require_api_key(api_key);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "message": HEALTH_MESSAGE })));

    let config_ingest = warp::path!("config" / "ingest")
        .and(warp::post())
        .and(auth.clone())
        .and(json_body::<ConfigPayload>())
        .and(with_store(store.clone()))
        .and_then(handlers::ingest_config);

    let ingest = warp::path!("ingest")
        .and(warp::post())
        .and(auth.clone())
        .and(json_body::<Vec<MatrixCell>>())
        .and(with_store(store.clone()))
        .and_then(handlers::ingest_status);

    let matrix = warp::path!("matrix")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handlers::list_matrix);

    let config = warp::path!("config")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handlers::list_config);

    let reset = warp::path!("admin" / "db")
        .and(warp::delete())
        .and(auth)
        .and(with_store(store))
        .and_then(handlers::reset);

    health
        .map(Reply::into_response)
        .or(config_ingest.map(Reply::into_response))
        .unify()
        .or(ingest.map(Reply::into_response))
        .unify()
        .or(matrix.map(Reply::into_response))
        .unify()
        .or(config.map(Reply::into_response))
        .unify()
        .or(reset.map(Reply::into_response))
        .unify()
}

fn cors(origins: &[String]) -> warp::cors::Builder {
    let valid = origins.iter().filter(|o| {
        let ok = o.starts_with("http://") || o.starts_with("https://");
        if !ok {
            tracing::warn!(origin = %o, "Ignoring CORS origin without http(s) scheme");
        }
        ok
    });
    warp::cors()
        .allow_origins(valid.map(String::as_str))
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "x-api-key"])
}

/// Complete server filter: API, dashboard, CORS, request log and error bodies
pub fn routes(
    store: SharedStore,
    config: &ServerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api_key = config.api_key.as_deref().map(Arc::<str>::from);
    let log = warp::log::custom(|info| {
        tracing::info!(
            method = %info.method(),
            path = info.path(),
            status = info.status().as_u16(),
            elapsed_ms = u64::try_from(info.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request"
        );
    });

    api(store, api_key)
        .or(spa(config.ui_dir.clone()))
        .with(cors(&config.cors_origins))
        .recover(handle_rejection)
        .with(log)
}
