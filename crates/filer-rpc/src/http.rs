//! HTTP surface of the filer.
//!
//! - `POST /rpc/<Operation>` takes and returns JSON. Failures carry an
//!   [`RpcError`] body with an HTTP status derived from the error kind.
//! - Any other `GET` lists the directory named by the request path.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use filer_proto::filer::RpcError;
use filer_types::{ErrorKind, RPCCode, Status};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::listing::{decode_path, list_directory, render_html, ListingQuery};
use crate::rpc::FilerRpc;

pub fn router(rpc: Arc<FilerRpc>) -> Router {
    Router::new()
        .route("/rpc/:op", post(handle_rpc))
        .fallback(handle_listing)
        .with_state(rpc)
}

pub fn http_status(status: &Status) -> StatusCode {
    match status.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A failed call rendered as an [`RpcError`] body.
pub struct RpcFailure(pub Status);

impl IntoResponse for RpcFailure {
    fn into_response(self) -> Response {
        let body = RpcError {
            code: self.0.code(),
            message: self.0.message().unwrap_or_default().to_string(),
        };
        (http_status(&self.0), Json(body)).into_response()
    }
}

async fn handle_rpc(
    State(rpc): State<Arc<FilerRpc>>,
    Path(op): Path<String>,
    body: Bytes,
) -> Response {
    let rpc = rpc.as_ref();
    match op.as_str() {
        "LookupDirectoryEntry" => dispatch(&op, &body, |r| rpc.lookup_directory_entry(r)).await,
        "ListEntries" => dispatch(&op, &body, |r| rpc.list_entries(r)).await,
        "GetEntryAttributes" => dispatch(&op, &body, |r| rpc.get_entry_attributes(r)).await,
        "CreateEntry" => dispatch(&op, &body, |r| rpc.create_entry(r)).await,
        "UpdateEntry" => dispatch(&op, &body, |r| rpc.update_entry(r)).await,
        "DeleteEntry" => dispatch(&op, &body, |r| rpc.delete_entry(r)).await,
        "AssignVolume" => dispatch(&op, &body, |r| rpc.assign_volume(r)).await,
        "LookupVolume" => dispatch(&op, &body, |r| rpc.lookup_volume(r)).await,
        _ => {
            let body = RpcError {
                code: RPCCode::INVALID_MESSAGE_TYPE,
                message: format!("unknown operation {op}"),
            };
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

async fn dispatch<Req, Rsp, F, Fut>(op: &str, body: &[u8], call: F) -> Response
where
    Req: DeserializeOwned,
    Rsp: Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = filer_types::Result<Rsp>>,
{
    let req: Req = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            let status = Status::with_message(
                filer_types::StatusCode::SERDE_INVALID_JSON,
                format!("{op}: {e}"),
            );
            return RpcFailure(status).into_response();
        }
    };
    match call(req).await {
        Ok(rsp) => Json(rsp).into_response(),
        Err(status) => {
            match status.kind() {
                ErrorKind::Internal | ErrorKind::RemoteUnavailable => {
                    tracing::warn!(op, error = %status, "rpc failed")
                }
                _ => tracing::debug!(op, error = %status, "rpc rejected"),
            }
            RpcFailure(status).into_response()
        }
    }
}

fn wants_json(headers: &HeaderMap, query: &ListingQuery) -> bool {
    let accept_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    accept_json || query.format.as_deref() == Some("json")
}

async fn handle_listing(
    State(rpc): State<Arc<FilerRpc>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let path = decode_path(uri.path());
    match list_directory(rpc.filer(), rpc.config(), &path, &query).await {
        Ok(listing) if wants_json(&headers, &query) => Json(listing).into_response(),
        Ok(listing) => Html(render_html(&listing)).into_response(),
        Err(status) => {
            tracing::debug!(%path, error = %status, "list directory failed");
            (StatusCode::NOT_FOUND, status.to_string()).into_response()
        }
    }
}
