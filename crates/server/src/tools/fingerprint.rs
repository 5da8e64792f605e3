//! fingerprint tool implementation.
//!
//! Fingerprints text and optionally compares it with a second text or a
//! previously issued fingerprint. No cache state is read or written.

use gistcache_core::{
    ChangeLevel, Error, Fingerprint,
    fingerprint::{classify, fingerprint, similarity},
};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the fingerprint tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FingerprintParams {
    /// Text to fingerprint.
    pub text: String,

    /// Optional second text to compare against. Mutually exclusive with
    /// `compare_fingerprint`.
    #[serde(default)]
    pub compare_text: Option<String>,

    /// Optional 16-hex-digit fingerprint to compare against.
    #[serde(default)]
    pub compare_fingerprint: Option<String>,
}

/// Output from the fingerprint tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FingerprintOutput {
    /// Lowercase 16-hex-digit fingerprint of `text`.
    pub fingerprint: String,
    /// Similarity to the comparison target, if one was given.
    pub similarity: Option<f64>,
    pub change: Option<ChangeLevel>,
}

/// Implementation of the fingerprint tool.
pub async fn fingerprint_impl(params: FingerprintParams) -> Result<CallToolResult, McpError> {
    let fp = fingerprint(&params.text);

    let other = match (&params.compare_fingerprint, &params.compare_text) {
        (Some(_), Some(_)) => {
            return Err(Error::InvalidInput("give compare_text or compare_fingerprint, not both".into()).into());
        }
        (Some(hex), None) => Some(hex.parse::<Fingerprint>()?),
        (None, Some(text)) => Some(fingerprint(text)),
        (None, None) => None,
    };

    let output = FingerprintOutput {
        fingerprint: fp.to_string(),
        similarity: other.map(|o| similarity(fp, o)),
        change: other.map(|o| classify(fp, o)),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::parse_output;

    #[tokio::test]
    async fn test_fingerprint_impl_alone() {
        let params = FingerprintParams { text: String::new(), compare_text: None, compare_fingerprint: None };
        let output: FingerprintOutput = parse_output(&fingerprint_impl(params).await.unwrap());
        assert_eq!(output.fingerprint, "0000000000000000");
        assert!(output.similarity.is_none());
    }

    #[tokio::test]
    async fn test_fingerprint_impl_compare_text() {
        let params = FingerprintParams {
            text: "Hello world".into(),
            compare_text: Some("hello, WORLD".into()),
            compare_fingerprint: None,
        };
        let output: FingerprintOutput = parse_output(&fingerprint_impl(params).await.unwrap());
        assert_eq!(output.similarity, Some(1.0));
        assert_eq!(output.change, Some(ChangeLevel::None));
    }

    #[tokio::test]
    async fn test_fingerprint_impl_compare_fingerprint() {
        let params = FingerprintParams {
            text: "Hello world".into(),
            compare_text: None,
            compare_fingerprint: Some(fingerprint("hello world").to_string()),
        };
        let output: FingerprintOutput = parse_output(&fingerprint_impl(params).await.unwrap());
        assert_eq!(output.similarity, Some(1.0));
    }

    #[tokio::test]
    async fn test_fingerprint_impl_rejects_both_targets() {
        let params = FingerprintParams {
            text: "Hello world".into(),
            compare_text: Some("Hello world".into()),
            compare_fingerprint: Some("0000000000000000".into()),
        };
        let err = fingerprint_impl(params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fingerprint_impl_bad_hex() {
        let params = FingerprintParams {
            text: "Hello world".into(),
            compare_text: None,
            compare_fingerprint: Some("not-hex".into()),
        };
        assert!(fingerprint_impl(params).await.is_err());
    }
}
