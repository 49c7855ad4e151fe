//! Servidor web Axum que alinha anotações a tokens e devolve as visões IOB

use std::collections::BTreeMap;

use align_core::{
    extract::entities_from_value, remove_group_prefix, Annotation, DefaultTokenizer, Diagnostic,
    Error, TaggedCorpus, TokenizerConfig,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Deserialize)]
struct AlignRequest {
    text: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
    /// JSON exportado no formato `{objects: [...]}`.
    #[serde(default)]
    export: Option<serde_json::Value>,
    #[serde(default)]
    normalize_groups: bool,
    #[serde(default)]
    tokenizer: Option<TokenizerConfig>,
}

#[derive(Serialize)]
struct AlignResponse {
    tokens: Vec<String>,
    token_char_spans: Vec<(usize, usize)>,
    tags: Vec<String>,
    dict: BTreeMap<String, Vec<String>>,
    iob: Vec<String>,
    multi_iob: Vec<Vec<String>>,
    dropped: Vec<Annotation>,
    diagnostics: Vec<Diagnostic>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("ALIGN_WEB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor de alinhamento iniciado em http://{}", addr);
    axum::serve(listener, app()).await
}

fn app() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/align", post(align_handler))
        .layer(cors)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Alinha as anotações do pedido e devolve todas as visões de uma vez.
async fn align_handler(Json(req): Json<AlignRequest>) -> Response {
    if req.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Texto vazio");
    }

    match align_request(req) {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                warn!(error = %err, "falha ao alinhar");
            }
            error_response(status, &err.to_string())
        }
    }
}

fn align_request(req: AlignRequest) -> align_core::Result<AlignResponse> {
    let mut annotations = req.annotations;
    if let Some(export) = &req.export {
        annotations.extend(entities_from_value(export)?.unwrap_or_default());
    }
    if req.normalize_groups {
        annotations = remove_group_prefix(&annotations);
    }

    let tokenizer = DefaultTokenizer::with_config(req.tokenizer.unwrap_or_default());
    let corpus = TaggedCorpus::with_tokenizer(req.text, &annotations, &tokenizer);

    let combined = corpus.to_annotated_view(None)?;
    let (multi_iob, _) = corpus.to_multi_iob_list()?;

    Ok(AlignResponse {
        tokens: corpus.tokens().into_iter().map(String::from).collect(),
        token_char_spans: corpus.token_char_spans(),
        tags: corpus.tags().into_iter().map(String::from).collect(),
        dict: corpus.to_dict(),
        iob: combined.iob_labels(),
        multi_iob,
        dropped: combined.dropped,
        diagnostics: corpus.diagnostics().to_vec(),
    })
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::MalformedInput(_) | Error::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::UnknownTag(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(serde_json::json!({"error": msg}))).into_response()
}
