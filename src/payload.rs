//! 画像ペイロード処理
//!
//! Base64文字列やアップロードされたバイト列を検証し、
//! ビジョンAPIへ送るJPEG（Base64）に変換する。

use crate::error::{LeafDoctorError, Result};
use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    Engine as _,
};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};

/// 対応する画像拡張子（大文字小文字は区別しない）
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

const JPEG_QUALITY: u8 = 85;
const JPEG_MIME: &str = "image/jpeg";

/// パディングの有無を問わないデコード設定
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// 送信用に変換済みの画像
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub base64: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    /// "data:image/jpeg;base64,..." 形式
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Base64文字列をデコード
///
/// `data:<mime>;base64,` プレフィックスと途中の改行・空白を許容する。
/// パディング省略とURLセーフ（`-` `_`）のアルファベットも受け付ける
pub fn decode_base64_image(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LeafDoctorError::InvalidImagePayload("画像データが空です".into()));
    }

    let data = if trimmed.starts_with("data:") {
        trimmed
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| LeafDoctorError::InvalidImagePayload("Data URLの形式が不正です".into()))?
    } else {
        trimmed
    };

    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(LeafDoctorError::InvalidImagePayload("画像データが空です".into()));
    }

    let engine = if compact.contains(['-', '_']) {
        &LENIENT_URL_SAFE
    } else {
        &LENIENT_STANDARD
    };

    engine
        .decode(compact.as_bytes())
        .map_err(|e| LeafDoctorError::InvalidImagePayload(format!("Base64デコードに失敗: {}", e)))
}

/// 画像を検証してJPEGに変換
///
/// 長辺が `max_size` を超える場合は縦横比を保って縮小する（0なら縮小しない）
pub fn prepare_image(bytes: &[u8], max_size: u32) -> Result<PreparedImage> {
    if bytes.is_empty() {
        return Err(LeafDoctorError::InvalidImagePayload("画像データが空です".into()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| LeafDoctorError::ImageLoad(e.to_string()))?;

    let img = if max_size > 0 && (img.width() > max_size || img.height() > max_size) {
        img.resize(max_size, max_size, FilterType::Triangle)
    } else {
        img
    };

    // JPEGはアルファチャンネル非対応
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| LeafDoctorError::ImageLoad(format!("JPEG変換に失敗: {}", e)))?;

    Ok(PreparedImage {
        base64: STANDARD.encode(&jpeg),
        mime_type: JPEG_MIME,
        width: rgb.width(),
        height: rgb.height(),
    })
}
