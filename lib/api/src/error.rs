use crate::source::FetchError;
use crate::tagger::TaggerError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Everything that can end a match request.
///
/// Rendered as `{"error": "<message>"}` with the status from
/// [`ResponseError::status_code`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Provide only one input: file OR image_url")]
    BothInputs,

    #[error("No image provided")]
    NoInput,

    #[error("Invalid image_url: {0}")]
    InvalidUrl(String),

    #[error("URL must end with .jpg, .jpeg, .png, or .webp")]
    UnsupportedExtension,

    #[error("Invalid '{name}' parameter: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("Image must be at most {limit} bytes")]
    ImageTooLarge { limit: usize },

    #[error("Failed to fetch URL image: {0}")]
    Fetch(#[from] FetchError),

    #[error("Tagging failed: {0}")]
    Tagging(#[from] TaggerError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ImageTooLarge { .. } | ApiError::Fetch(FetchError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Tagging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
