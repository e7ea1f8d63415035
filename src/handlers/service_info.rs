use super::AppState;
use crate::{
    Result,
    types::{OrganismLink, ServiceInfo},
};
use axum::{Json, extract::State};

pub async fn service_info(State(state): State<AppState>) -> Result<Json<ServiceInfo>> {
    let organisms = state
        .catalog
        .list_organisms()
        .await?
        .into_iter()
        .map(|o| OrganismLink {
            url: state.catalog.organism_url(&o.common_name),
            common_name: o.common_name,
            genus: o.genus,
            species: o.species,
        })
        .collect();

    Ok(Json(ServiceInfo {
        name: "chado-jbrowse".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Chado-JBrowse connector".to_string(),
        organisms,
    }))
}
