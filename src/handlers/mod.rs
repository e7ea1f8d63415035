mod catalog;
mod features;
mod service_info;

pub use catalog::{ref_seqs, stats_global, track_list, tracks_conf};
pub use features::get_features;
pub use service_info::service_info;

use crate::{
    backend::Backend, catalog::CatalogBuilder, dispatch::RangeDispatcher, policy::ErrorPolicy,
};
use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    routing::any,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

const ALLOWED_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RangeDispatcher,
    pub catalog: CatalogBuilder,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, service_address: String, policy: ErrorPolicy) -> Self {
        Self {
            dispatcher: RangeDispatcher::new(backend.clone(), policy),
            catalog: CatalogBuilder::new(backend, policy, service_address),
        }
    }
}

/// Build the router. Every route answers any HTTP method.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(service_info))
        .route("/service-info", any(service_info))
        .route("/link/:organism/refSeqs.json", any(ref_seqs))
        .route("/link/:organism/stats/global", any(stats_global))
        .route("/link/:organism/features/:refseq", any(get_features))
        .route("/link/:organism/tracks.conf", any(tracks_conf))
        .route("/link/:organism/trackList.json", any(track_list))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                // CorsLayer only sets this on preflight
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOWED_HEADERS),
                )),
        )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}
