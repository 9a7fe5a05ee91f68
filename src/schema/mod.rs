//! JSON 入出力の定義モジュール。
//!
//! ジョブ記述は JSON Schema で実行前に検証し、
//! 結果は `serde` で直列化するレコード型で返す。
pub mod job;
pub mod output;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

pub use self::output::{
    AnalysisOutput, CategoryRecord, ClassificationOutput, ClusterMember, ClusterRecord,
    ConceptRecord, DocRecord, ScoredDoc, SentimentRecord,
};

/// スキーマ検証結果。
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// JSON Schemaでデータを検証する。
///
/// # Arguments
/// * `schema_json` - JSON Schema定義（JSON形式）
/// * `instance` - 検証対象のデータ（JSON形式）
#[must_use]
pub fn validate_json(schema_json: &Value, instance: &Value) -> ValidationResult {
    match JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(schema_json)
    {
        Ok(schema) => match schema.validate(instance) {
            Ok(()) => ValidationResult::valid(),
            Err(errors) => ValidationResult::invalid(
                errors
                    .map(|e| format!("{} at {}", e, e.instance_path))
                    .collect(),
            ),
        },
        Err(e) => ValidationResult::invalid(vec![format!("Schema compilation error: {e}")]),
    }
}
