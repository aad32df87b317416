use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handler::classify_handler::classify_image;
use crate::state::classify_state::ClassifyState;

pub fn new_classify_route() -> Router<ClassifyState> {
    Router::new()
        .route("/classify_image", post(classify_image))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            25 * 1024 * 1024, /* 25mb */
        ))
}
