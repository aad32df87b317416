use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use axum::routing::{get, IntoMakeService};
use axum::{middleware, Json, Router};
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_request_id::RequestIdLayer;

use crate::config::settings::SETTINGS;
use crate::error::errors::ResponseCode;
use crate::middleware::request_id_mw::generate_request_id_mw;
use crate::models::classify_model::ClassificationResultOutput;
use crate::pipeline::classify_pipeline::classify_pipeline::ClassificationPipeline;
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult};
use crate::routes::v1::classify::new_classify_route;
use crate::state::classify_state::ClassifyState;

#[derive(Clone, Serialize, Deserialize)]
struct FallbackResponse {
    message: String,
}

#[derive(Clone)]
pub struct RouterState {
    classify_pipeline: Arc<ClassificationPipeline>,
}

impl RouterState {
    pub fn new(classify_pipeline: ClassificationPipeline) -> Self {
        RouterState {
            classify_pipeline: Arc::new(classify_pipeline),
        }
    }
}

pub fn root_routes(router_state: RouterState) -> IntoMakeService<Router> {
    let v1_router = {
        let classify_state = ClassifyState::new(&router_state.classify_pipeline);
        let classify_route = new_classify_route().with_state(classify_state);

        Router::new().nest("/v1", classify_route)
    };

    let mut request_timeout_duration: u64 = 20;
    if let Some(_request_timeout) = SETTINGS.server.request_timeout {
        request_timeout_duration = _request_timeout;
    }

    let app_router = Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(Router::new().route("/health", get(healthcheck)))
                .merge(v1_router)
                .layer(CompressionLayer::new()),
        )
        .layer(PropagateHeaderLayer::new(header::HeaderName::from_static("x-request-id")))
        .layer(CorsLayer::permissive().allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS]))
        .layer(RequestIdLayer)
        .layer(middleware::from_fn(generate_request_id_mw))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_duration)))
        .layer(SetSensitiveHeadersLayer::new(std::iter::once(header::AUTHORIZATION)))
        .fallback(fallback)
        .into_make_service();
    app_router
}

async fn fallback(uri: Uri) -> (StatusCode, Json<FallbackResponse>) {
    (StatusCode::NOT_FOUND, Json(FallbackResponse {
        message: format!("No route for {uri}"),
    }))
}

async fn healthcheck(headers: HeaderMap) -> GeneralResponseResult<BaseResponse<Vec<ClassificationResultOutput>>> {
    let request_id_header = headers.get("x-request-id").unwrap().to_str().unwrap();
    let request_id: String = request_id_header.parse().unwrap();

    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: None,
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id: request_id.clone(),
        })
        .build())
}
