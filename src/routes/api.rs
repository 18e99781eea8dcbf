//! Info endpoint.
//!
//! `GET /` reports the service name and version, the templated routes
//! served by the tile and WMTS modules, the tileset files currently in
//! the cache directory, and the effective configuration.

use std::path::PathBuf;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::cache;
use crate::routes::AppState;

/// Templated GET routes exposed by the external tile and WMTS modules.
pub const HTTP_GET_ROUTES: [&str; 4] = [
    "/<mbtiles>",
    "/<mbtiles>/{zoom}/{x}/{y}",
    "/<mbtiles>/WMTS",
    "/<mbtiles>/WMTS/1.0.0/WMTSCapabilities.xml",
];

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub api: String,
    pub http: HttpRoutes,
    pub mbtiles: Vec<String>,
    pub ok: bool,
    pub protocol: String,
    pub cache: PathBuf,
    pub port: u16,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct HttpRoutes {
    #[serde(rename = "GET")]
    pub get: Vec<&'static str>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(info))
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let settings = state.config.snapshot();

    Json(InfoResponse {
        api: format!("mbtiles-server {}", env!("CARGO_PKG_VERSION")),
        http: HttpRoutes {
            get: HTTP_GET_ROUTES.to_vec(),
        },
        mbtiles: cache::list_tilesets(&settings.cache),
        ok: true,
        protocol: settings.protocol.clone(),
        cache: settings.cache.clone(),
        port: settings.port,
        status: 200,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_response_shape() {
        let response = InfoResponse {
            api: "mbtiles-server 0.1.0".into(),
            http: HttpRoutes {
                get: HTTP_GET_ROUTES.to_vec(),
            },
            mbtiles: vec!["world.mbtiles".into()],
            ok: true,
            protocol: "http".into(),
            cache: PathBuf::from("/tmp/t1"),
            port: 5001,
            status: 200,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["ok"], true);
        assert_eq!(value["port"], 5001);
        assert_eq!(value["cache"], "/tmp/t1");
        assert_eq!(value["http"]["GET"].as_array().unwrap().len(), 4);
        assert_eq!(value["mbtiles"][0], "world.mbtiles");
    }
}
