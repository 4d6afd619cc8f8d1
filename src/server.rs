//! HTTPサーバー
//!
//! - POST /disease-detection       : `{"image": "<base64>"}`
//! - POST /disease-detection-file  : multipart アップロード
//!
//! 成功時は解析結果JSON、失敗時は `{"detail": "..."}` を返す

use crate::analyzer::LeafDiseaseDetector;
use crate::error::{LeafDoctorError, Result};
use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use leaf_doctor_common::{DiseaseAnalysisResult, Verdict};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// リクエストボディの上限（20MiB）
const BODY_LIMIT: usize = 20 * 1024 * 1024;

pub type SharedDetector = Arc<LeafDiseaseDetector>;

/// エラーレスポンス
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<LeafDoctorError> for ApiError {
    fn from(err: LeafDoctorError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_upstream_error() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "Request failed");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(detector: SharedDetector) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/disease-detection", post(detect_base64))
        .route("/disease-detection-file", post(detect_file))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(detector)
}

pub async fn serve(detector: SharedDetector, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LeafDoctorError::Server(format!("{} にバインドできません: {}", addr, e)))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(detector)).await?;
    Ok(())
}

async fn index(State(detector): State<SharedDetector>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "model": detector.model_name(),
        "endpoints": ["/disease-detection", "/disease-detection-file", "/health"],
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Base64画像の解析
async fn detect_base64(
    State(detector): State<SharedDetector>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<DiseaseAnalysisResult>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let image = match payload.get("image") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::String(_)) => return Err(ApiError::bad_request("image が空です")),
        Some(_) => return Err(ApiError::bad_request("image はBase64文字列で指定してください")),
        None => return Err(ApiError::bad_request("image がありません")),
    };

    let result = detector.analyze_base64(image).await?;
    log_verdict(&result);
    Ok(Json(result))
}

/// アップロードファイルの解析
///
/// `file` / `image` フィールドを優先し、なければ最初の空でないフィールドを使う
async fn detect_file(
    State(detector): State<SharedDetector>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<DiseaseAnalysisResult>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut chosen: Option<Bytes> = None;
    let mut fallback: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("multipartの読み込みに失敗: {}", e)))?
    {
        let is_file_field = matches!(field.name(), Some("file") | Some("image"));
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("ファイルの読み込みに失敗: {}", e)))?;

        if is_file_field {
            chosen = Some(data);
            break;
        }
        if fallback.is_none() && !data.is_empty() {
            fallback = Some(data);
        }
    }

    let data = chosen
        .or(fallback)
        .ok_or_else(|| ApiError::bad_request("ファイルがアップロードされていません"))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("アップロードされたファイルが空です"));
    }

    let result = detector.analyze_bytes(&data).await?;
    log_verdict(&result);
    Ok(Json(result))
}

fn log_verdict(result: &DiseaseAnalysisResult) {
    match result.verdict() {
        Verdict::InvalidImage { reason } => info!(%reason, "Invalid image uploaded"),
        Verdict::Healthy => info!(confidence = result.confidence(), "No disease detected"),
        Verdict::Diseased { name, kind, severity } => info!(
            name = name.as_deref().unwrap_or("-"),
            %kind,
            %severity,
            confidence = result.confidence(),
            "Disease detected"
        ),
    }
}
