//! HTTP transport.
//!
//! Three routes: `GET /api/tipos` lists type definitions, `POST /api/sequence`
//! issues a number, `GET /health` answers liveness probes. The two API routes
//! require the shared key in `X-API-Key`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::{AddrIncoming, AddrStream};
use hyper::body::HttpBody;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ecf_sequence_core::{Channel, EventSink, TypeCode};
use ecf_sequence_store::SequenceStore;

use crate::error::Result;
use crate::service::SequenceService;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest request body accepted on `POST /api/sequence`.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Body of `POST /api/sequence`.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceRequest {
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(default)]
    pub cta: Option<String>,
}

/// Successful response of `POST /api/sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceResponse {
    pub sequence: String,
    #[serde(rename = "sequenceNumber")]
    pub sequence_number: String,
}

/// Request handler shared by every connection.
pub struct ApiServer<S: SequenceStore> {
    service: SequenceService<S>,
    key_digest: blake3::Hash,
    events: Arc<dyn EventSink>,
}

impl<S: SequenceStore + 'static> ApiServer<S> {
    pub fn new(service: SequenceService<S>, api_key: &str, events: Arc<dyn EventSink>) -> Self {
        Self {
            service,
            key_digest: blake3::hash(api_key.as_bytes()),
            events,
        }
    }

    /// Route one request.
    pub async fn handle(&self, req: Request<Body>, remote: SocketAddr) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        debug!(%method, %path, %remote, "request");

        match (&method, path.as_str()) {
            (_, "/health") => json_response(StatusCode::OK, &serde_json::json!({ "status": "healthy" })),
            (&Method::GET, "/api/tipos") => {
                if !self.authorized(&req) {
                    return self.unauthorized(remote);
                }
                self.list_types().await
            }
            (&Method::POST, "/api/sequence") => {
                if !self.authorized(&req) {
                    return self.unauthorized(remote);
                }
                self.sequence(req.into_body()).await
            }
            (_, "/api/tipos") | (_, "/api/sequence") => {
                text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            _ => text_response(StatusCode::NOT_FOUND, "Not found"),
        }
    }

    /// `blake3::Hash` equality is constant-time.
    fn authorized(&self, req: &Request<Body>) -> bool {
        req.headers()
            .get(API_KEY_HEADER)
            .map(|value| blake3::hash(value.as_bytes()) == self.key_digest)
            .unwrap_or(false)
    }

    fn unauthorized(&self, remote: SocketAddr) -> Response<Body> {
        warn!(%remote, "rejected request with bad API key");
        self.events
            .record(&format!("Unauthorized access attempt from {}", remote));
        text_response(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    async fn list_types(&self) -> Response<Body> {
        match self.service.list_types().await {
            Ok(types) => json_response(StatusCode::OK, &types),
            Err(e) => {
                error!(error = %e, "listing type definitions failed");
                self.events
                    .record(&format!("Error getting record types: {}", e));
                text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    async fn sequence(&self, body: Body) -> Response<Body> {
        let body = match read_body(body, MAX_BODY_BYTES).await {
            Ok(body) => body,
            Err(response) => return response,
        };
        let request: SequenceRequest = match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "malformed sequence request");
                return text_response(StatusCode::BAD_REQUEST, "Invalid request body");
            }
        };
        let type_code = match TypeCode::parse(&request.type_code) {
            Ok(code) => code,
            Err(_) => return text_response(StatusCode::BAD_REQUEST, "Invalid sequence type"),
        };
        let channel = Channel::parse_or_default(request.cta.as_deref());

        match self.service.allocate(type_code, channel).await {
            Ok(sequence) => json_response(
                StatusCode::OK,
                &SequenceResponse {
                    sequence: sequence.text(),
                    sequence_number: sequence.number.to_string(),
                },
            ),
            Err(e) => text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    }
}

/// Bind the listening socket. Must be called inside the runtime.
pub fn bind(addr: SocketAddr) -> Result<AddrIncoming> {
    Ok(AddrIncoming::bind(&addr)?)
}

/// Serve connections from `incoming` until `shutdown` resolves, then let
/// in-flight requests finish.
pub async fn serve<S, F>(server: Arc<ApiServer<S>>, incoming: AddrIncoming, shutdown: F) -> Result<()>
where
    S: SequenceStore + 'static,
    F: Future<Output = ()>,
{
    let local = incoming.local_addr();

    let make_service = make_service_fn(move |conn: &AddrStream| {
        let server = Arc::clone(&server);
        let remote = conn.remote_addr();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let server = Arc::clone(&server);
                async move { Ok::<_, Infallible>(server.handle(req, remote).await) }
            }))
        }
    });

    info!(addr = %local, "listening");
    Server::builder(incoming)
        .serve(make_service)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

/// Buffer at most `limit` bytes of `body`.
async fn read_body(mut body: Body, limit: usize) -> std::result::Result<Vec<u8>, Response<Body>> {
    let too_large = || text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");

    if body.size_hint().upper().map_or(false, |upper| upper > limit as u64) {
        return Err(too_large());
    }

    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| {
            debug!(error = %e, "unreadable request body");
            text_response(StatusCode::BAD_REQUEST, "Invalid request body")
        })?;
        if buf.len() + chunk.len() > limit {
            return Err(too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn text_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{}\n", message)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
