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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod engine;
mod error;
mod noise;
pub mod pointer;

pub use engine::{DiffEngine, DiffOperation, JsonPatchEngine, OperationKind, PatchEngine};
pub use error::{EngineError, NoiseError, Target};
pub use noise::{MaskOperation, NoiseModel};
