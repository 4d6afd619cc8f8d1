//! Leaf Doctor Common Library
//!
//! CLIとHTTPサーバーで共有される型とレスポンス解釈ロジック

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{DiseaseAnalysisResult, DiseaseFields, DiseaseKind, Severity, Verdict};
pub use error::{Error, Result};
pub use parser::{excerpt, extract_json_object, fields_from_object, parse_disease_response, strip_code_fence};
pub use prompts::{build_analysis_prompt, DISEASE_TYPES, SEVERITY_LEVELS};
