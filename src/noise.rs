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

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::engine::{DiffEngine, DiffOperation, JsonPatchEngine, OperationKind, PatchEngine};
use crate::error::{NoiseError, Target};
use crate::pointer;

/// Instruction to overwrite the value at `path` with a placeholder.
///
/// Serializes to the RFC 6902 form `{"op":"replace","path":...,"value":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename = "replace")]
pub struct MaskOperation {
    pub path: String,
    pub value: Value,
}

impl MaskOperation {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// Always [`OperationKind::Replace`]: masking never adds or removes fields.
    pub fn kind(&self) -> OperationKind {
        OperationKind::Replace
    }
}

/// Masks the location changed by `operation`, discarding whatever value the
/// diff reported there.
fn mask(operation: &DiffOperation, placeholder: &Value) -> MaskOperation {
    MaskOperation::new(operation.path.clone(), placeholder.clone())
}

/// Set of noisy JSON locations for one comparison session.
///
/// Noise is registered either up front with [`NoiseModel::initialize`] or by
/// diffing two responses that are expected to be equivalent with
/// [`NoiseModel::detect`]. [`NoiseModel::remove`] then overwrites every noisy
/// location with the same placeholder in both documents of a pair, so an
/// exact comparison of the results ignores those locations.
///
/// # Examples
///
/// ```
/// use json_noise::NoiseModel;
///
/// let mut noise = NoiseModel::new();
/// noise
///     .detect(br#"{"id":1,"ts":100}"#, br#"{"id":1,"ts":200}"#)
///     .unwrap();
///
/// let (primary, candidate) = noise
///     .remove(br#"{"id":1,"ts":100}"#, br#"{"id":1,"ts":999}"#)
///     .unwrap();
/// assert_eq!(primary, candidate);
/// ```
#[derive(Debug, Clone)]
pub struct NoiseModel<E = JsonPatchEngine> {
    operations: Vec<MaskOperation>,
    placeholder: Value,
    engine: E,
}

impl NoiseModel<JsonPatchEngine> {
    /// Constructs an empty model backed by [`JsonPatchEngine`] whose
    /// placeholder is `0`.
    pub fn new() -> Self {
        Self {
            operations: vec![],
            placeholder: Value::from(0),
            engine: JsonPatchEngine,
        }
    }
}

impl Default for NoiseModel<JsonPatchEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> NoiseModel<E> {
    /// Sets the value written at every noisy location.
    ///
    /// Operations already registered are rewritten to it, so every operation
    /// of a model carries the same value.
    pub fn with_placeholder(mut self, placeholder: Value) -> Self {
        for operation in &mut self.operations {
            operation.value = placeholder.clone();
        }
        self.placeholder = placeholder;
        self
    }

    /// Swaps the diff and patch backend.
    pub fn with_engine<F>(self, engine: F) -> NoiseModel<F> {
        NoiseModel {
            operations: self.operations,
            placeholder: self.placeholder,
            engine,
        }
    }

    /// Registers JSON Pointers known to be noisy, such as timestamps or
    /// generated identifiers.
    ///
    /// Paths are not checked against any document.
    pub fn initialize<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let placeholder = &self.placeholder;
        self.operations.extend(
            paths
                .into_iter()
                .map(|path| MaskOperation::new(path, placeholder.clone())),
        );
    }

    /// Registers noisy locations written either as JSON Pointers (`/ts`) or
    /// as concrete JSONPath expressions (`$.user.updatedAt`).
    ///
    /// Nothing is registered if any expression fails to convert.
    pub fn initialize_jsonpaths<I, S>(&mut self, paths: I) -> Result<(), NoiseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pointers = paths
            .into_iter()
            .map(|path| pointer::normalize(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        self.initialize(pointers);
        Ok(())
    }

    pub fn contains_noise(&self) -> bool {
        !self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[MaskOperation] {
        &self.operations
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.path.as_str())
    }

    pub fn placeholder(&self) -> &Value {
        &self.placeholder
    }
}

impl<E: DiffEngine> NoiseModel<E> {
    /// Records every location whose value differs between `primary` and
    /// `secondary`.
    ///
    /// The documents must differ only by replaced values below the root. Any
    /// added, removed or moved location, or a replacement of the whole
    /// document, fails with [`NoiseError::StructuralChange`], and the model
    /// is left as it was.
    pub fn detect(&mut self, primary: &[u8], secondary: &[u8]) -> Result<(), NoiseError> {
        let diff = self
            .engine
            .diff(primary, secondary)
            .map_err(NoiseError::Diff)?;

        // a root mask would make any two documents equal
        if let Some(operation) = diff
            .iter()
            .find(|op| op.kind != OperationKind::Replace || op.path.is_empty())
        {
            debug!(operation = %operation, "rejecting structural change");
            return Err(NoiseError::StructuralChange {
                operation: operation.to_string(),
            });
        }

        debug!(count = diff.len(), "detected noisy paths");
        let placeholder = &self.placeholder;
        self.operations
            .extend(diff.iter().map(|operation| mask(operation, placeholder)));

        Ok(())
    }
}

impl<E: PatchEngine> NoiseModel<E> {
    /// Overwrites every noisy location in both `primary` and `candidate`.
    ///
    /// Returns both inputs untouched when the model holds no noise. Fails if
    /// a noisy location does not exist in either document; no output is
    /// returned in that case.
    pub fn remove<'p, 'c>(
        &self,
        primary: &'p [u8],
        candidate: &'c [u8],
    ) -> Result<(Cow<'p, [u8]>, Cow<'c, [u8]>), NoiseError> {
        if !self.contains_noise() {
            trace!("no noise registered");
            return Ok((Cow::Borrowed(primary), Cow::Borrowed(candidate)));
        }

        let patch = serde_json::to_vec(&self.operations)
            .map_err(|err| NoiseError::PatchApplication {
                target: Target::Patch,
                source: err.into(),
            })
            .and_then(|bytes| {
                self.engine
                    .decode(&bytes)
                    .map_err(|source| NoiseError::PatchApplication {
                        target: Target::Patch,
                        source,
                    })
            })?;

        trace!(count = self.operations.len(), "masking primary");
        let primary = self.engine.apply(&patch, primary).map_err(|source| {
            NoiseError::PatchApplication {
                target: Target::Primary,
                source,
            }
        })?;

        trace!(count = self.operations.len(), "masking candidate");
        let candidate = self.engine.apply(&patch, candidate).map_err(|source| {
            NoiseError::PatchApplication {
                target: Target::Candidate,
                source,
            }
        })?;

        Ok((Cow::Owned(primary), Cow::Owned(candidate)))
    }
}
