use axum::debug_handler;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use ecs_logger::extra_fields;
use http::{HeaderMap, StatusCode};
use log::{error, info};

use crate::error::errors::ResponseCode;
use crate::logger::logger::LoggerExtraFields;
use crate::models::classify_model::{ClassificationInput, ClassificationResultOutput};
use crate::pipeline::errors::PipelineError;
use crate::response::common_response::{BaseResponse, GeneralResponseBuilder, GeneralResponseResult};
use crate::state::classify_state::ClassifyState;

fn failure(
    status_code: StatusCode,
    response_code: ResponseCode,
    message: &str,
    request_id: &str,
) -> GeneralResponseResult<BaseResponse<Vec<ClassificationResultOutput>>> {
    Ok(GeneralResponseBuilder::new()
        .status_code(status_code)
        .body(BaseResponse {
            data: None,
            response_message: message.to_string(),
            response_code: ResponseCode::response_code(response_code),
            is_success: false,
            request_id: request_id.to_string(),
        })
        .build())
}

#[debug_handler(state=ClassifyState)]
pub async fn classify_image(
    headers: HeaderMap,
    State(state): State<ClassifyState>,
    mut payload: Multipart,
) -> GeneralResponseResult<BaseResponse<Vec<ClassificationResultOutput>>> {
    let request_id_header = headers.get("x-request-id").unwrap().to_str().unwrap();
    let request_id: String = request_id_header.parse().unwrap();
    let mut image_data: Bytes = Bytes::new();

    extra_fields::set_extra_fields(LoggerExtraFields {
        request_id: request_id.clone(),
    })
    .unwrap();

    info!("received classification request");

    while let Some(field) = payload.next_field().await.unwrap() {
        let name = field.name().unwrap().to_string();
        match name.as_str() {
            "image_data" => {
                match field.bytes().await {
                    Ok(data) => {
                        if data.is_empty() {
                            return failure(
                                StatusCode::BAD_REQUEST,
                                ResponseCode::ErrorCodeInput,
                                "image is empty",
                                &request_id,
                            );
                        }
                        image_data = data;
                    }
                    Err(e) => {
                        error!("failed to retrieve image from request: {e}");
                        return failure(
                            StatusCode::BAD_REQUEST,
                            ResponseCode::ErrorCodeInput,
                            "failed to process image",
                            &request_id,
                        );
                    }
                };
            }
            _ => {}
        }
    }

    if image_data.is_empty() {
        return failure(
            StatusCode::BAD_REQUEST,
            ResponseCode::ErrorCodeInput,
            "no image data provided",
            &request_id,
        );
    }

    let input = ClassificationInput { image_data };

    let results = match state.classify_service.classify_image(input).await {
        Ok(results) => results,
        Err(PipelineError::Decode(e)) => {
            error!("rejected undecodable payload: {e}");
            return failure(
                StatusCode::BAD_REQUEST,
                ResponseCode::ErrorCodeInput,
                "failed to decode image",
                &request_id,
            );
        }
        Err(e) => {
            error!("failed to classify image: {e}");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseCode::ErrorCodeServer,
                "internal server error",
                &request_id,
            );
        }
    };

    // Empty is a valid pipeline outcome, presented to callers as
    // "no face detected" rather than a processing failure
    if results.is_empty() {
        return failure(
            StatusCode::BAD_REQUEST,
            ResponseCode::ErrorCodeNoFace,
            "no face detected in image",
            &request_id,
        );
    }

    info!("completed classifying image: {} face(s)", results.len());

    extra_fields::clear_extra_fields();
    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(BaseResponse {
            data: Some(results),
            response_message: "OK".to_string(),
            response_code: ResponseCode::response_code(ResponseCode::CodeOK),
            is_success: true,
            request_id: request_id.clone(),
        })
        .build())
}
