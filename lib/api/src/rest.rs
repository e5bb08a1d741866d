use crate::config::ServerConfig;
use crate::cors::OriginPolicy;
use crate::error::ApiError;
use crate::matcher::Matcher;
use crate::source::{ImageSource, MatchInput};
use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use bytes::{Bytes, BytesMut};
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tagmatch_similarity::RankParams;
use tracing::{info, warn};

/// Form field carrying the uploaded image
const IMAGE_FIELD: &str = "image";
/// Query/form field carrying the image URL
const IMAGE_URL_FIELD: &str = "image_url";
/// Upper bound for non-file form values
const FORM_VALUE_LIMIT: usize = 64 * 1024;

/// Shared per-process state handed to every handler
pub struct AppState {
    pub matcher: Matcher,
    pub max_image_bytes: usize,
}

#[derive(Debug, Default)]
struct MatchQuery {
    threshold: Option<String>,
    limit: Option<String>,
    image_url: Option<String>,
}

impl MatchQuery {
    /// Parse the query string; a repeated key keeps its first value.
    fn parse(query_string: &str) -> Self {
        let mut query = MatchQuery::default();
        for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
            let slot = match key.as_ref() {
                "threshold" => &mut query.threshold,
                "limit" => &mut query.limit,
                IMAGE_URL_FIELD => &mut query.image_url,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }

    fn rank_params(&self) -> Result<RankParams, ApiError> {
        let mut params = RankParams::default();
        if let Some(raw) = self.threshold.as_deref() {
            params.threshold = raw.trim().parse().map_err(|_| ApiError::InvalidParameter {
                name: "threshold",
                value: raw.to_string(),
            })?;
        }
        if let Some(raw) = self.limit.as_deref() {
            params.limit = raw.trim().parse().map_err(|_| ApiError::InvalidParameter {
                name: "limit",
                value: raw.to_string(),
            })?;
        }
        Ok(params)
    }
}

/// Inputs found in the request body
#[derive(Default)]
struct FormInput {
    upload: Option<ImageSource>,
    image_url: Option<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, config: ServerConfig) -> std::io::Result<()> {
        let state = web::Data::from(state);
        let origins = OriginPolicy::new(&config.allowed_origins);

        HttpServer::new(move || {
            App::new()
                .wrap(origins.middleware())
                .app_data(state.clone())
                .configure(routes)
        })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
    }
}

/// Register the HTTP routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/match")
            .route(web::get().to(match_image))
            .route(web::post().to(match_image)),
    )
    .route("/health", web::get().to(health));
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "products": state.matcher.catalog().len(),
    }))
}

async fn match_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let result = handle_match(&state, &req, payload).await;
    match result {
        Ok(response) => Ok(response),
        Err(e) => {
            if matches!(e, ApiError::Tagging(_)) {
                tracing::error!("{} {}: {}", req.method(), req.path(), e);
            } else {
                warn!("{} {}: {}", req.method(), req.path(), e);
            }
            Err(e)
        }
    }
}

async fn handle_match(
    state: &AppState,
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let query = MatchQuery::parse(req.query_string());
    let params = query.rank_params()?;

    let form = read_form(req, payload, state.max_image_bytes).await?;
    let input = MatchInput {
        upload: form.upload,
        image_url: non_empty(query.image_url).or(form.image_url),
    };

    let response = state.matcher.run(input, params).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn read_form(
    req: &HttpRequest,
    payload: web::Payload,
    max_image_bytes: usize,
) -> Result<FormInput, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(Multipart::new(req.headers(), payload), max_image_bytes).await
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let body = read_body(payload, FORM_VALUE_LIMIT).await?;
        let image_url = url::form_urlencoded::parse(&body)
            .find(|(key, _)| key == IMAGE_URL_FIELD)
            .map(|(_, value)| value.into_owned());
        Ok(FormInput {
            upload: None,
            image_url: non_empty(image_url),
        })
    } else {
        Ok(FormInput::default())
    }
}

async fn read_multipart(mut multipart: Multipart, max_image_bytes: usize) -> Result<FormInput, ApiError> {
    let mut form = FormInput::default();

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| ApiError::InvalidForm(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .filter(|f| !f.is_empty())
                    .map(str::to_string);
                let declared_type = field.content_type().map(|m| m.to_string());
                let bytes = read_field(&mut field, max_image_bytes)
                    .await?
                    .ok_or(ApiError::ImageTooLarge { limit: max_image_bytes })?;

                // A part without a filename is a plain form value, not a file
                if let (None, Some(filename)) = (&form.upload, filename) {
                    info!("Received upload {} ({} bytes)", filename, bytes.len());
                    form.upload = Some(ImageSource::upload(filename, declared_type.as_deref(), bytes));
                }
            }
            IMAGE_URL_FIELD => {
                let bytes = read_field(&mut field, FORM_VALUE_LIMIT)
                    .await?
                    .ok_or_else(|| ApiError::InvalidForm("image_url is too long".to_string()))?;
                if form.image_url.is_none() {
                    form.image_url = non_empty(Some(String::from_utf8_lossy(&bytes).into_owned()));
                }
            }
            _ => {
                while field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::InvalidForm(e.to_string()))?
                    .is_some()
                {}
            }
        }
    }

    Ok(form)
}

/// Read a multipart field, `None` once it exceeds `limit` bytes
async fn read_field(field: &mut Field, limit: usize) -> Result<Option<Bytes>, ApiError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::InvalidForm(e.to_string()))?
    {
        if data.len() + chunk.len() > limit {
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Some(data.freeze()))
}

async fn read_body(mut payload: web::Payload, limit: usize) -> Result<Bytes, ApiError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ApiError::InvalidForm(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(ApiError::InvalidForm("form body is too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
