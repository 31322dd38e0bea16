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

use thiserror::Error;

/// Error type for [`NoiseModel`](crate::NoiseModel) operations.
#[derive(Debug, Error)]
pub enum NoiseError {
    /// The two documents passed to detection could not be diffed.
    #[error("unable to diff documents: {0}")]
    Diff(#[source] EngineError),

    /// The diff between primary and secondary contains something other than
    /// value replacements.
    #[error("primary and secondary documents contain changes other than replaced values: {operation}")]
    StructuralChange {
        /// The offending operation in its RFC 6902 JSON form.
        operation: String,
    },

    /// The masking patch could not be decoded or applied.
    #[error("unable to apply noise patch to {target}: {source}")]
    PatchApplication {
        target: Target,
        #[source]
        source: EngineError,
    },

    /// A JSONPath expression cannot be turned into a JSON Pointer.
    #[error("invalid noise path {path}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Which part of a removal failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    /// The serialized masking patch itself.
    Patch,
    Primary,
    Candidate,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Patch => write!(f, "patch document"),
            Target::Primary => write!(f, "primary document"),
            Target::Candidate => write!(f, "candidate document"),
        }
    }
}

/// Error reported by a [`DiffEngine`](crate::DiffEngine) or
/// [`PatchEngine`](crate::PatchEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Patch(#[from] json_patch::PatchError),

    /// The documents have different JSON types at the root.
    #[error("documents are not comparable: primary root is {primary}, secondary root is {secondary}")]
    IncompatibleRoots {
        primary: &'static str,
        secondary: &'static str,
    },

    /// Free-form failure for engines not backed by `json-patch`.
    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let err = NoiseError::StructuralChange {
            operation: r#"{"op":"add","path":"/extra","value":true}"#.to_string(),
        };
        assert!(err.to_string().contains(r#""op":"add""#));

        let err = NoiseError::PatchApplication {
            target: Target::Candidate,
            source: EngineError::Custom("path /nonce does not exist".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unable to apply noise patch to candidate document: path /nonce does not exist"
        );

        let err = NoiseError::Diff(EngineError::IncompatibleRoots {
            primary: "an object",
            secondary: "an array",
        });
        assert_eq!(
            err.to_string(),
            "unable to diff documents: documents are not comparable: primary root is an object, secondary root is an array"
        );
    }
}
