pub mod chat_api;

pub use chat_api::ChatApiClient;

use crate::config::Config;
use crate::error::{LeafDoctorError, Result};
use crate::payload::{decode_base64_image, prepare_image, PreparedImage};
use crate::scanner::ImageInfo;
use async_trait::async_trait;
use leaf_doctor_common::{build_analysis_prompt, parse_disease_response, DiseaseAnalysisResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// ビジョンモデルへの1回分の入力
pub struct VisionRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a PreparedImage,
}

/// 画像＋テキストを受け取り返答テキストを返すモデル
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// ログ用のモデル名
    fn name(&self) -> &str;

    /// 返答テキスト（未加工）を返す
    async fn complete(&self, request: &VisionRequest<'_>) -> Result<String>;
}

/// 葉の病害検出サービス
///
/// `main` で一度だけ生成し、HTTPハンドラやCLIに渡して使い回す
pub struct LeafDiseaseDetector {
    client: Arc<dyn VisionClient>,
    prompt: String,
    max_image_size: u32,
}

impl LeafDiseaseDetector {
    pub fn new(client: Arc<dyn VisionClient>, max_image_size: u32) -> Self {
        info!(model = client.name(), "Leaf Disease Detector initialized");
        Self {
            client,
            prompt: build_analysis_prompt(),
            max_image_size,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ChatApiClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.max_image_size))
    }

    pub fn model_name(&self) -> &str {
        self.client.name()
    }

    /// Base64画像を解析
    pub async fn analyze_base64(&self, image: &str) -> Result<DiseaseAnalysisResult> {
        let bytes = decode_base64_image(image)?;
        self.analyze_bytes(&bytes).await
    }

    /// 画像バイト列を解析
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> Result<DiseaseAnalysisResult> {
        info!(bytes = bytes.len(), "Starting analysis");

        let image = prepare_image(bytes, self.max_image_size)?;
        let request = VisionRequest {
            prompt: &self.prompt,
            image: &image,
        };

        let reply = self.client.complete(&request).await.map_err(|e| {
            error!(error = %e, "Vision API request failed");
            e
        })?;
        info!(reply_len = reply.len(), "API request completed");

        parse_reply(&reply)
    }

    /// 画像ファイルを解析
    pub async fn analyze_file(&self, path: &Path) -> Result<DiseaseAnalysisResult> {
        if !path.is_file() {
            return Err(LeafDoctorError::FileNotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        self.analyze_bytes(&bytes).await
    }

    /// 複数画像を順番に解析
    ///
    /// 1枚の失敗で全体を止めず、エラー内容を結果に残す
    pub async fn analyze_images(&self, images: &[ImageInfo], verbose: bool) -> Vec<BatchEntry> {
        let mut entries = Vec::with_capacity(images.len());

        for (idx, img) in images.iter().enumerate() {
            if verbose {
                println!("  [{}/{}] {}", idx + 1, images.len(), img.file_name);
            }

            let outcome = self.analyze_file(&img.path).await;
            if let Err(e) = &outcome {
                error!(file = %img.file_name, error = %e, "Analysis failed");
            }
            entries.push(BatchEntry::new(img, outcome));
        }

        entries
    }
}

/// モデルの返答をパース（共通パーサーをラップ）
fn parse_reply(reply: &str) -> Result<DiseaseAnalysisResult> {
    parse_disease_response(reply).map_err(|e| LeafDoctorError::ApiParse(e.to_string()))
}

/// 一括解析の1件分
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub file_name: String,
    pub file_path: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// 1件分の結果（JSONでは `result` または `error` キーになる）
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Result(DiseaseAnalysisResult),
    Error(String),
}

impl BatchEntry {
    fn new(img: &ImageInfo, outcome: Result<DiseaseAnalysisResult>) -> Self {
        let outcome = match outcome {
            Ok(result) => BatchOutcome::Result(result),
            Err(e) => BatchOutcome::Error(e.to_string()),
        };
        Self {
            file_name: img.file_name.clone(),
            file_path: img.path.display().to_string(),
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Error(_))
    }
}
