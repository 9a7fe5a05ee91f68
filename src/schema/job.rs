//! 分析ジョブ記述の JSON Schema 定義。
use std::sync::LazyLock;

use serde_json::{Value, json};

/// `AnalysisJob` 封筒の JSON Schema。
pub static ANALYSIS_JOB_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Analysis Job",
        "description": "One text-analysis job over an in-memory batch of documents",
        "type": "object",
        "properties": {
            "analysis": {
                "type": "string",
                "enum": ["concepts", "clustering", "classification", "sentiment"]
            },
            "documents": {
                "type": "array",
                "description": "Plain texts, or {text, label} objects for classification",
                "items": {
                    "oneOf": [
                        { "type": "string" },
                        { "$ref": "#/$defs/labeled_document" }
                    ]
                }
            },
            "params": {
                "type": "object",
                "description": "Flat parameter mapping; missing keys take defaults",
                "properties": {
                    "num_concepts": { "type": "integer", "minimum": 0 },
                    "num_clusters": { "type": "integer", "minimum": 1 },
                    "vocab_size": { "type": "integer", "minimum": 1 },
                    "train_p": { "type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 1 },
                    "neu_inf_lim": { "type": "number", "minimum": -1, "maximum": 1 },
                    "neu_sup_lim": { "type": "number", "minimum": -1, "maximum": 1 },
                    "ngram_range": {
                        "type": "array",
                        "items": { "type": "integer", "minimum": 1 },
                        "minItems": 2,
                        "maxItems": 2
                    },
                    "context_words": { "type": "array", "items": { "type": "string" } },
                    "language": { "type": "string" },
                    "algorithm": { "type": "string", "enum": ["kmeans", "agglomerative"] },
                    "model_kind": { "type": "string" },
                    "scorer": { "type": "string" },
                    "seed": { "type": "integer", "minimum": 0 },
                    "n_init": { "type": "integer", "minimum": 1 },
                    "iterative": { "type": "boolean" },
                    "threshold": { "type": "number", "exclusiveMinimum": 0, "maximum": 1 },
                    "n_sub_clusters": { "type": "integer", "minimum": 2 },
                    "top_terms": { "type": "integer", "minimum": 1 }
                }
            }
        },
        "required": ["analysis", "documents"],
        "$defs": {
            "labeled_document": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "label": { "type": ["null", "string"] }
                },
                "required": ["text"]
            }
        }
    })
});

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::validate_json;

    #[test]
    fn accepts_mixed_labeled_documents() {
        let job = json!({
            "analysis": "classification",
            "documents": [
                { "text": "bus late", "label": "transit" },
                { "text": "new park", "label": null },
                "plain text"
            ],
            "params": { "train_p": 0.7 }
        });
        let result = validate_json(&ANALYSIS_JOB_SCHEMA, &job);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn rejects_unknown_analysis_and_bad_train_p() {
        let job = json!({
            "analysis": "summarize",
            "documents": [],
            "params": { "train_p": 1.0 }
        });
        let result = validate_json(&ANALYSIS_JOB_SCHEMA, &job);
        assert!(!result.valid);
        assert!(result.errors.len() >= 2);
    }

    #[test]
    fn requires_documents() {
        let result = validate_json(&ANALYSIS_JOB_SCHEMA, &json!({ "analysis": "concepts" }));
        assert!(!result.valid);
    }
}
