//! プロンプト生成モジュール
//!
//! - DISEASE_TYPES / SEVERITY_LEVELS: 出力語彙
//! - build_analysis_prompt: 葉画像判定＋病害解析用プロンプト

/// 病害の種類（葉画像の場合）
pub const DISEASE_TYPES: &[&str] = &[
    "fungal",
    "bacterial",
    "viral",
    "pest",
    "nutrient deficiency",
    "healthy",
];

/// 重症度
pub const SEVERITY_LEVELS: &[&str] = &["mild", "moderate", "severe", "none"];

/// 解析プロンプト生成
///
/// 最初に葉の画像かどうかを判定させ、葉でなければ `invalid_image` 形式で返させる。
/// 出力はどちらも同じJSONスキーマ。
pub fn build_analysis_prompt() -> String {
    let disease_types = DISEASE_TYPES.join("/");
    let severity_levels = SEVERITY_LEVELS.join("/");

    format!(
        r#"IMPORTANT: First determine if this image contains a plant leaf or vegetation. If the image shows humans, animals, objects, buildings, or anything other than plant leaves/vegetation, return the "invalid_image" response format below.

If this is a valid leaf/plant image, analyze it for diseases and return the results in JSON format.

Please identify:
1. Whether this is actually a leaf/plant image
2. Disease name (if any)
3. Disease type/category or invalid_image
4. Severity level ({severity_levels})
5. Confidence score (0-100)
6. Symptoms observed
7. Possible causes
8. Treatment recommendations

For NON-LEAF images (humans, animals, objects, or not detected as leaves), return this format:
{{
    "disease_detected": false,
    "disease_name": null,
    "disease_type": "invalid_image",
    "severity": "none",
    "confidence": 95,
    "symptoms": ["This image does not contain a plant leaf"],
    "possible_causes": ["Invalid image type uploaded"],
    "treatment": ["Please upload an image of a plant leaf for disease analysis"]
}}

For VALID LEAF images, return this format:
{{
    "disease_detected": true/false,
    "disease_name": "name of disease or null",
    "disease_type": "{disease_types}",
    "severity": "{severity_levels}",
    "confidence": 85,
    "symptoms": ["list", "of", "symptoms"],
    "possible_causes": ["list", "of", "causes"],
    "treatment": ["list", "of", "treatments"]
}}

Return ONLY the JSON object, without any additional text."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_gating_instruction() {
        let prompt = build_analysis_prompt();
        assert!(prompt.contains("plant leaf"));
        assert!(prompt.contains("\"disease_type\": \"invalid_image\""));
    }

    #[test]
    fn test_prompt_contains_vocabulary() {
        let prompt = build_analysis_prompt();
        assert!(prompt.contains("fungal/bacterial/viral/pest/nutrient deficiency/healthy"));
        assert!(prompt.contains("mild/moderate/severe/none"));
    }

    #[test]
    fn test_prompt_lists_all_fields() {
        let prompt = build_analysis_prompt();
        for field in [
            "disease_detected",
            "disease_name",
            "severity",
            "confidence",
            "symptoms",
            "possible_causes",
            "treatment",
        ] {
            assert!(prompt.contains(field), "missing field: {}", field);
        }
    }
}
