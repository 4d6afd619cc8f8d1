//! APIレスポンスパーサー
//!
//! ビジョンモデルの自由形式テキストからJSONオブジェクトを抽出し、
//! DiseaseAnalysisResult に変換する。
//!
//! JSONであることには厳格、各フィールドの形には寛容。

use std::borrow::Cow;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::types::{DiseaseAnalysisResult, DiseaseFields, UNKNOWN};

const FENCE: &str = "```";

/// エラーメッセージに含める生レスポンスの最大文字数
pub const EXCERPT_LIMIT: usize = 200;

lazy_static::lazy_static! {
    // 最初の `{` から最後の `}` まで（貪欲、改行を含む）
    static ref BRACE_SPAN_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// コードフェンスを除去
///
/// 前後の空白を除き、先頭が ``` で始まる場合は言語タグ（```json 等）ごと
/// すべてのフェンスを取り除いて再度トリムする。
///
/// # Examples
/// ```
/// use leaf_doctor_common::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
/// assert_eq!(strip_code_fence("  {} "), "{}");
/// ```
pub fn strip_code_fence(response: &str) -> Cow<'_, str> {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return Cow::Borrowed(trimmed);
    };

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    Cow::Owned(rest.replace(FENCE, "").trim().to_string())
}

/// 生レスポンスの先頭を切り出す（末尾に `...` を付与）
pub fn excerpt(response: &str, limit: usize) -> String {
    let head: String = response.chars().take(limit).collect();
    format!("{}...", head)
}

/// APIレスポンスからJSONオブジェクトを抽出
///
/// 抽出優先順位:
/// 1. フェンス除去後の全体を厳密にパース
/// 2. 元のテキストから `{...}` の範囲を探してパース
/// 3. エラー（先頭200文字を含む）
///
/// JSON配列やスカラーは次の段階へ回す
pub fn extract_json_object(response: &str) -> Result<Map<String, Value>> {
    let cleaned = strip_code_fence(response);
    if let Some(object) = parse_object(&cleaned) {
        debug!("レスポンスをJSONとしてパース");
        return Ok(object);
    }

    warn!("JSONとしてパースできないため、本文からJSONを抽出します");
    if let Some(object) = BRACE_SPAN_RE
        .find(response)
        .and_then(|span| parse_object(span.as_str()))
    {
        debug!("本文中のJSONを抽出してパース");
        return Ok(object);
    }

    error!(raw_response = %response, "レスポンスをJSONとして解釈できません");
    Err(Error::Parse {
        message: "Unable to parse API response as JSON".into(),
        excerpt: excerpt(response, EXCERPT_LIMIT),
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        Ok(other) => {
            debug!(kind = json_kind(&other), "JSONオブジェクトではありません");
            None
        }
        Err(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSONオブジェクトから各フィールドを取り出す
///
/// 欠損はデフォルト値。`confidence` が数値に変換できない場合のみエラー。
pub fn fields_from_object(object: &Map<String, Value>) -> Result<DiseaseFields> {
    Ok(DiseaseFields {
        disease_detected: coerce_bool(object.get("disease_detected")),
        disease_name: coerce_optional_text(object.get("disease_name")),
        disease_type: coerce_text_or_unknown(object.get("disease_type")),
        severity: coerce_text_or_unknown(object.get("severity")),
        confidence: coerce_confidence(object.get("confidence"))?,
        symptoms: coerce_list(object.get("symptoms")),
        possible_causes: coerce_list(object.get("possible_causes")),
        treatment: coerce_list(object.get("treatment")),
    })
}

/// 病害解析レスポンスをパース
///
/// # Arguments
/// * `response` - ビジョンモデルの返答テキスト
///
/// # Returns
/// * `Ok(DiseaseAnalysisResult)` - パース成功（タイムスタンプは現在時刻）
/// * `Err` - JSONが見つからない、または confidence が不正
///
/// # Examples
/// ```
/// use leaf_doctor_common::parse_disease_response;
///
/// let result = parse_disease_response(r#"{"disease_detected": true, "confidence": 87}"#).unwrap();
/// assert!(result.disease_detected());
/// assert_eq!(result.confidence(), 87.0);
/// assert_eq!(result.disease_type(), "unknown");
/// ```
pub fn parse_disease_response(response: &str) -> Result<DiseaseAnalysisResult> {
    let object = extract_json_object(response)?;
    let fields = fields_from_object(&object)?;
    Ok(DiseaseAnalysisResult::new(fields))
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "" | "false" | "no" | "0" => false,
            _ => true,
        },
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_to_text(v)),
    }
}

fn coerce_text_or_unknown(value: Option<&Value>) -> String {
    coerce_optional_text(value).unwrap_or_else(|| UNKNOWN.to_string())
}

fn coerce_confidence(value: Option<&Value>) -> Result<f64> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(v) => v,
    };

    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(Error::InvalidField {
            field: "confidence",
            reason: format!("数値に変換できません: {}", excerpt(&raw.to_string(), EXCERPT_LIMIT)),
        }),
    }
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_to_text)
            .collect(),
        Some(other) => vec![value_to_text(other)],
    }
}
