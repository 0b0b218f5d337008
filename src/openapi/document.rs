//! OpenAPI v2 document model.
//!
//! Only the members the gateway relies on are typed. Each entry under
//! `paths` and every other top-level member is kept as an opaque JSON value
//! in its original order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why upstream bytes were rejected as a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported swagger version '{0}', expected 2.x")]
    UnsupportedVersion(String),
}

/// An upstream's self-description in OpenAPI v2 (Swagger) form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// Schema version marker, e.g. `"2.0"`.
    pub swagger: String,

    pub info: Info,

    /// Path template → operation description, uninterpreted.
    pub paths: Map<String, Value>,

    /// `definitions`, `securityDefinitions` and anything else at top level.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OpenApiDocument {
    /// Parse and structurally validate raw document bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_slice(bytes)?;
        if document.swagger != "2" && !document.swagger.starts_with("2.") {
            return Err(DocumentError::UnsupportedVersion(document.swagger));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let doc = OpenApiDocument::from_slice(
            br#"{"swagger":"2.0","info":{"title":"T","version":"v1"},"paths":{"/x":{}}}"#,
        )
        .unwrap();
        assert_eq!(doc.info.title, "T");
        assert_eq!(doc.info.version, "v1");
        assert!(doc.paths.contains_key("/x"));
        assert!(doc.extra.is_empty());
    }

    #[test]
    fn keeps_opaque_members_in_order() {
        let raw = br#"{
            "swagger": "2.0",
            "info": {"title": "Kubernetes", "version": "v1.30.2", "x-vendor": true},
            "paths": {
                "/api/": {"get": {"operationId": "getCoreAPIVersions", "x-kubernetes-action": "get"}},
                "/api/v1/pods": {"get": {"operationId": "listCoreV1PodForAllNamespaces"}},
                "/apis/": {"get": {"operationId": "getAPIVersions"}}
            },
            "definitions": {"io.k8s.api.core.v1.Pod": {"type": "object"}},
            "securityDefinitions": {"BearerToken": {"type": "apiKey"}}
        }"#;
        let doc = OpenApiDocument::from_slice(raw).unwrap();

        let keys: Vec<_> = doc.paths.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/api/", "/api/v1/pods", "/apis/"]);
        assert_eq!(
            doc.paths["/api/"]["get"]["x-kubernetes-action"],
            Value::String("get".into())
        );
        assert!(doc.extra.contains_key("definitions"));
        assert_eq!(doc.info.extra["x-vendor"], Value::Bool(true));

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["info"]["title"], "Kubernetes");
        assert_eq!(out["securityDefinitions"]["BearerToken"]["type"], "apiKey");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = OpenApiDocument::from_slice(b"{\"swagger\": \"2.0\", ").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn rejects_missing_members() {
        let err = OpenApiDocument::from_slice(br#"{"swagger":"2.0","info":{"title":"T"},"paths":{}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("version"));

        assert!(OpenApiDocument::from_slice(br#"{"swagger":"2.0","info":{"title":"T","version":"v"}}"#).is_err());
    }

    #[test]
    fn rejects_openapi_v3() {
        let err = OpenApiDocument::from_slice(
            br#"{"swagger":"3.0.0","info":{"title":"T","version":"v1"},"paths":{}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion(v) if v == "3.0.0"));
    }
}
