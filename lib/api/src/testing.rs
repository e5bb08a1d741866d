//! Test doubles: in-memory tagger and fetcher that record every call, and
//! a local HTTP upstream for exercising the real reqwest adapters.

use crate::source::{FetchError, ImageFetcher, ImageSource};
use crate::tagger::{Extraction, Tagger, TaggerError};
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tagmatch_core::{Catalog, Tag};
use url::Url;

/// Two products: id 1 scores 16.0 and id 2 scores 8.0 for `[cat]`
pub fn sample_catalog() -> Catalog {
    Catalog::from_document(serde_json::json!({
        "products": [
            {"id": 1, "imagga_tags": [
                {"tag": "cat", "confidence": 80},
                {"tag": "dog", "confidence": 10}
            ]},
            {"id": 2, "imagga_tags": [{"tag": "cat", "confidence": 40}]}
        ]
    }))
    .expect("sample catalog is valid")
}

pub struct RecordingTagger {
    extraction: Option<Extraction>,
    calls: AtomicUsize,
    last_filename: Mutex<Option<String>>,
}

impl RecordingTagger {
    pub fn returning(tags: Vec<Tag>, rate_limit_remaining: Option<u64>) -> Self {
        Self {
            extraction: Some(Extraction {
                tags,
                rate_limit_remaining,
            }),
            calls: AtomicUsize::new(0),
            last_filename: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            extraction: None,
            calls: AtomicUsize::new(0),
            last_filename: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_filename(&self) -> Option<String> {
        self.last_filename.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tagger for RecordingTagger {
    async fn tag(&self, image: &ImageSource) -> Result<Extraction, TaggerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filename.lock().unwrap() = Some(image.filename().to_string());
        self.extraction.clone().ok_or_else(|| TaggerError::Status {
            status: 401,
            body: "invalid credentials".to_string(),
        })
    }
}

pub struct RecordingFetcher {
    failure_status: Option<u16>,
    calls: AtomicUsize,
}

impl RecordingFetcher {
    pub fn succeeding() -> Self {
        Self {
            failure_status: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            failure_status: Some(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for RecordingFetcher {
    async fn fetch(&self, url: &Url) -> Result<ImageSource, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure_status {
            Some(status) => Err(FetchError::Status(status)),
            None => Ok(ImageSource::fetched(url.clone(), Bytes::from_static(b"image"))),
        }
    }
}

/// Request received by [`MockUpstream`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canned reply served for every request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
    /// Stream the body in small chunks without a Content-Length
    pub chunked: bool,
}

impl MockResponse {
    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            chunked: false,
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::bytes(status, body.to_string()).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }
}

struct UpstreamState {
    response: MockResponse,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// HTTP server on an ephemeral local port that records every request and
/// answers each with the same [`MockResponse`].
pub struct MockUpstream {
    addr: SocketAddr,
    state: web::Data<UpstreamState>,
}

impl MockUpstream {
    pub async fn start(response: MockResponse) -> Self {
        let state = web::Data::new(UpstreamState {
            response,
            requests: Mutex::new(Vec::new()),
        });
        let app_state = state.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .default_service(web::to(reply))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind mock upstream");
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn reply(req: HttpRequest, body: web::Bytes, state: web::Data<UpstreamState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        headers,
        body,
    });

    let response = &state.response;
    let mut builder = HttpResponse::build(StatusCode::from_u16(response.status).unwrap());
    for (name, value) in &response.headers {
        builder.insert_header((*name, value.clone()));
    }

    if response.chunked {
        let chunks: Vec<Result<Bytes, std::io::Error>> = response
            .body
            .chunks(16)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        builder.streaming(futures_util::stream::iter(chunks))
    } else {
        builder.body(response.body.clone())
    }
}
