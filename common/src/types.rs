//! 解析結果の型定義
//!
//! - DiseaseFields: レスポンスから取り出した生の値
//! - DiseaseAnalysisResult: 最終出力（生成後は不変）
//! - Verdict: 呼び出し側が分岐に使う判定結果

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;

/// `disease_type` が省略されたときの値
pub const UNKNOWN: &str = "unknown";

/// 非葉画像を示す `disease_type`
pub const INVALID_IMAGE: &str = "invalid_image";

const DEFAULT_INVALID_REASON: &str = "This image does not contain a plant leaf";

/// パーサーが組み立てる入力値
///
/// 不変の [`DiseaseAnalysisResult`] を生成するためだけに使う
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseFields {
    pub disease_detected: bool,
    pub disease_name: Option<String>,
    pub disease_type: String,
    pub severity: String,
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub possible_causes: Vec<String>,
    pub treatment: Vec<String>,
}

impl Default for DiseaseFields {
    fn default() -> Self {
        Self {
            disease_detected: false,
            disease_name: None,
            disease_type: UNKNOWN.to_string(),
            severity: UNKNOWN.to_string(),
            confidence: 0.0,
            symptoms: Vec::new(),
            possible_causes: Vec::new(),
            treatment: Vec::new(),
        }
    }
}

/// 葉の病害解析結果
///
/// フィールドは非公開。生成時に `analysis_timestamp` が一度だけ設定される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseAnalysisResult {
    disease_detected: bool,
    disease_name: Option<String>,
    disease_type: String,
    severity: String,
    confidence: f64,
    symptoms: Vec<String>,
    possible_causes: Vec<String>,
    treatment: Vec<String>,
    analysis_timestamp: DateTime<FixedOffset>,
}

impl DiseaseAnalysisResult {
    /// 現在時刻（ローカル）で生成
    pub fn new(fields: DiseaseFields) -> Self {
        Self::with_timestamp(fields, Local::now().fixed_offset())
    }

    /// タイムスタンプを指定して生成
    pub fn with_timestamp(fields: DiseaseFields, analysis_timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            disease_detected: fields.disease_detected,
            disease_name: fields.disease_name,
            disease_type: fields.disease_type,
            severity: fields.severity,
            confidence: fields.confidence,
            symptoms: fields.symptoms,
            possible_causes: fields.possible_causes,
            treatment: fields.treatment,
            analysis_timestamp,
        }
    }

    pub fn disease_detected(&self) -> bool {
        self.disease_detected
    }

    pub fn disease_name(&self) -> Option<&str> {
        self.disease_name.as_deref()
    }

    pub fn disease_type(&self) -> &str {
        &self.disease_type
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn possible_causes(&self) -> &[String] {
        &self.possible_causes
    }

    pub fn treatment(&self) -> &[String] {
        &self.treatment
    }

    pub fn analysis_timestamp(&self) -> DateTime<FixedOffset> {
        self.analysis_timestamp
    }

    /// `disease_type` の分類
    pub fn kind(&self) -> DiseaseKind {
        DiseaseKind::parse(&self.disease_type)
    }

    /// `severity` の分類
    pub fn severity_level(&self) -> Severity {
        Severity::parse(&self.severity)
    }

    /// 呼び出し側が分岐するための判定
    ///
    /// `invalid_image` は `disease_detected` の値に関係なく優先される
    pub fn verdict(&self) -> Verdict {
        match self.kind() {
            DiseaseKind::InvalidImage => Verdict::InvalidImage {
                reason: self
                    .symptoms
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_INVALID_REASON.to_string()),
            },
            kind if self.disease_detected => Verdict::Diseased {
                name: self.disease_name.clone(),
                kind,
                severity: self.severity_level(),
            },
            _ => Verdict::Healthy,
        }
    }
}

/// 病害の種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiseaseKind {
    Fungal,
    Bacterial,
    Viral,
    Pest,
    NutrientDeficiency,
    Healthy,
    InvalidImage,
    Unknown,
    /// 語彙外の値（モデル出力の揺れ）
    Other(String),
}

impl DiseaseKind {
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "fungal" => DiseaseKind::Fungal,
            "bacterial" => DiseaseKind::Bacterial,
            "viral" => DiseaseKind::Viral,
            "pest" => DiseaseKind::Pest,
            "nutrient deficiency" => DiseaseKind::NutrientDeficiency,
            "healthy" => DiseaseKind::Healthy,
            "invalid image" => DiseaseKind::InvalidImage,
            "unknown" | "" => DiseaseKind::Unknown,
            _ => DiseaseKind::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DiseaseKind::Fungal => "fungal",
            DiseaseKind::Bacterial => "bacterial",
            DiseaseKind::Viral => "viral",
            DiseaseKind::Pest => "pest",
            DiseaseKind::NutrientDeficiency => "nutrient deficiency",
            DiseaseKind::Healthy => "healthy",
            DiseaseKind::InvalidImage => INVALID_IMAGE,
            DiseaseKind::Unknown => UNKNOWN,
            DiseaseKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for DiseaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 重症度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    None,
    Unknown,
}

impl Severity {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "mild" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "none" => Severity::None,
            _ => Severity::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Mild => write!(f, "mild"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::Severe => write!(f, "severe"),
            Severity::None => write!(f, "none"),
            Severity::Unknown => write!(f, "unknown"),
        }
    }
}

/// 解析結果の判定
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// 葉の画像ではない
    InvalidImage { reason: String },
    Healthy,
    Diseased {
        name: Option<String>,
        kind: DiseaseKind,
        severity: Severity,
    },
}
