// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Kind of an RFC 6902 patch operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Remove => write!(f, "remove"),
            OperationKind::Replace => write!(f, "replace"),
            OperationKind::Move => write!(f, "move"),
            OperationKind::Copy => write!(f, "copy"),
            OperationKind::Test => write!(f, "test"),
        }
    }
}

/// One operation of the patch transforming one document into another, as
/// reported by a [`DiffEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffOperation {
    #[serde(rename = "op")]
    pub kind: OperationKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl DiffOperation {
    pub fn new(kind: OperationKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            from: None,
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Writes the operation in its RFC 6902 JSON form.
impl fmt::Display for DiffOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

/// Computes the operations transforming `primary` into `secondary`.
pub trait DiffEngine {
    fn diff(&self, primary: &[u8], secondary: &[u8]) -> Result<Vec<DiffOperation>, EngineError>;
}

/// Decodes serialized patch documents and applies them to JSON documents.
pub trait PatchEngine {
    /// Decoded form of a patch document.
    type Patch;

    /// Decodes a JSON array of operation objects.
    fn decode(&self, patch: &[u8]) -> Result<Self::Patch, EngineError>;

    /// Applies every operation of `patch`, in order, to `document`.
    ///
    /// Fails if any operation's path does not resolve in `document`.
    fn apply(&self, patch: &Self::Patch, document: &[u8]) -> Result<Vec<u8>, EngineError>;
}

/// [`DiffEngine`] and [`PatchEngine`] backed by the `json-patch` crate.
///
/// Operations cross the library boundary in their RFC 6902 serde form, so
/// nothing outside this type depends on `json_patch` operation structs.
/// Documents produced by [`PatchEngine::apply`] are compact JSON.
#[derive(Debug, Default, Copy, Clone)]
pub struct JsonPatchEngine;

fn root_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl DiffEngine for JsonPatchEngine {
    fn diff(&self, primary: &[u8], secondary: &[u8]) -> Result<Vec<DiffOperation>, EngineError> {
        let primary: Value = serde_json::from_slice(primary)?;
        let secondary: Value = serde_json::from_slice(secondary)?;

        if root_type(&primary) != root_type(&secondary) {
            return Err(EngineError::IncompatibleRoots {
                primary: root_type(&primary),
                secondary: root_type(&secondary),
            });
        }

        let patch = json_patch::diff(&primary, &secondary);
        let operations = serde_json::from_value(serde_json::to_value(&patch)?)?;

        Ok(operations)
    }
}

impl PatchEngine for JsonPatchEngine {
    type Patch = json_patch::Patch;

    fn decode(&self, patch: &[u8]) -> Result<Self::Patch, EngineError> {
        Ok(serde_json::from_slice(patch)?)
    }

    fn apply(&self, patch: &Self::Patch, document: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut document: Value = serde_json::from_slice(document)?;
        json_patch::patch(&mut document, &patch.0)?;

        Ok(serde_json::to_vec(&document)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn diff(primary: Value, secondary: Value) -> Vec<DiffOperation> {
        JsonPatchEngine
            .diff(
                primary.to_string().as_bytes(),
                secondary.to_string().as_bytes(),
            )
            .unwrap()
    }

    #[test]
    fn test_diff_equal_documents() {
        let ops = diff(json!({ "a": [1, 2], "b": null }), json!({ "a": [1, 2], "b": null }));
        assert_eq!(ops, vec![]);
    }

    #[test]
    fn test_diff_replaced_values() {
        let ops = diff(
            json!({ "id": 1, "name": "x", "ts": 100 }),
            json!({ "id": 1, "name": "x", "ts": 200 }),
        );
        assert_eq!(
            ops,
            vec![DiffOperation::new(OperationKind::Replace, "/ts").with_value(json!(200))]
        );

        let ops = diff(json!({ "a": { "b": [1, 2] } }), json!({ "a": { "b": [1, 3] } }));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Replace);
        assert_eq!(ops[0].path, "/a/b/1");
    }

    #[test]
    fn test_diff_structural_changes() {
        let ops = diff(json!({ "id": 1 }), json!({ "id": 1, "extra": true }));
        assert_eq!(
            ops,
            vec![DiffOperation::new(OperationKind::Add, "/extra").with_value(json!(true))]
        );

        let ops = diff(json!({ "id": 1, "gone": "x" }), json!({ "id": 1 }));
        assert_eq!(ops, vec![DiffOperation::new(OperationKind::Remove, "/gone")]);

        let ops = diff(json!([1]), json!([1, 2]));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Add);
    }

    #[test]
    fn test_diff_invalid_json() {
        let result = JsonPatchEngine.diff(b"{\"a\": 1", b"{}");
        assert!(matches!(result, Err(EngineError::Json(_))));

        let result = JsonPatchEngine.diff(b"{}", b"");
        assert!(matches!(result, Err(EngineError::Json(_))));
    }

    #[test]
    fn test_diff_incompatible_roots() {
        let result = JsonPatchEngine.diff(br#"{"id":1,"name":"x"}"#, b"[1,2,3]");
        match result {
            Err(EngineError::IncompatibleRoots { primary, secondary }) => {
                assert_eq!(primary, "an object");
                assert_eq!(secondary, "an array");
            }
            other => panic!("unexpected result {:?}", other),
        }

        let result = JsonPatchEngine.diff(b"1", br#""1""#);
        assert!(matches!(result, Err(EngineError::IncompatibleRoots { .. })));

        let result = JsonPatchEngine.diff(b"null", b"{}");
        assert!(matches!(result, Err(EngineError::IncompatibleRoots { .. })));
    }

    #[test]
    fn test_operation_display() {
        let op = DiffOperation::new(OperationKind::Add, "/extra").with_value(json!(true));
        assert_eq!(op.to_string(), r#"{"op":"add","path":"/extra","value":true}"#);

        let op = DiffOperation::new(OperationKind::Remove, "/gone");
        assert_eq!(op.to_string(), r#"{"op":"remove","path":"/gone"}"#);
    }

    #[test]
    fn test_decode() {
        let patch = JsonPatchEngine.decode(br#"[{"op":"replace","path":"/ts","value":0}]"#);
        assert!(patch.is_ok());

        let patch = JsonPatchEngine.decode(br#"[{"op":"replace"}]"#);
        assert!(matches!(patch, Err(EngineError::Json(_))));

        let patch = JsonPatchEngine.decode(br#"[{"op":"shuffle","path":"/ts"}]"#);
        assert!(patch.is_err());

        let patch = JsonPatchEngine.decode(b"not a patch");
        assert!(patch.is_err());
    }

    #[test]
    fn test_apply() {
        let patch = JsonPatchEngine
            .decode(br#"[{"op":"replace","path":"/ts","value":0}]"#)
            .unwrap();

        let document = JsonPatchEngine
            .apply(&patch, br#"{"id": 1, "ts": 100}"#)
            .unwrap();
        let document: Value = serde_json::from_slice(&document).unwrap();
        assert_eq!(document, json!({ "id": 1, "ts": 0 }));

        let result = JsonPatchEngine.apply(&patch, br#"{"id": 1}"#);
        assert!(matches!(result, Err(EngineError::Patch(_))));

        let result = JsonPatchEngine.apply(&patch, b"[");
        assert!(matches!(result, Err(EngineError::Json(_))));
    }
}
