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

//! Conversion of concrete JSONPath expressions into JSON Pointers.
//!
//! Only expressions addressing exactly one location are accepted: `$`,
//! dotted fields (`$.user.name`), quoted fields (`$['a/b']`) and array
//! indexes (`$.items[0]`). Wildcards and slices are rejected since a mask
//! operation replaces a single location.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::NoiseError;

const SEGMENT: &str = r"\.([A-Za-z_][A-Za-z0-9_\-]*)|\[(\d+)\]|\['([^']*)'\]";
const MULTIPLE: &str = r"\.\*|\[\*\]|\[\d*:\d*\]";

static FULL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(&format!(r"^\$(?:{})*$", SEGMENT)));
static SEGMENT_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(SEGMENT));
static MULTIPLE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(MULTIPLE));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Key<'a> {
    Idx(usize),
    Field(&'a str),
}

impl<'a> fmt::Display for Key<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Idx(idx) => write!(f, "/{}", idx),
            Key::Field(field) => write!(f, "/{}", field.replace('~', "~0").replace('/', "~1")),
        }
    }
}

/// Returns `true` when `path` already looks like a JSON Pointer.
pub fn is_pointer(path: &str) -> bool {
    path.is_empty() || path.starts_with('/')
}

/// Converts a concrete JSONPath expression into a JSON Pointer.
///
/// ```
/// use json_noise::pointer::from_jsonpath;
///
/// assert_eq!(from_jsonpath("$.user.comments[1].timestamp").unwrap(), "/user/comments/1/timestamp");
/// assert_eq!(from_jsonpath("$['a/b']").unwrap(), "/a~1b");
/// assert!(from_jsonpath("$.items[*].id").is_err());
/// ```
pub fn from_jsonpath(jsonpath: &str) -> Result<String, NoiseError> {
    let invalid = |reason: &str| NoiseError::InvalidPath {
        path: jsonpath.to_string(),
        reason: reason.to_string(),
    };

    let full = FULL_RE.as_ref().map_err(|e| invalid(&e.to_string()))?;
    if !full.is_match(jsonpath) {
        let multiple = MULTIPLE_RE.as_ref().map_err(|e| invalid(&e.to_string()))?;
        if multiple.is_match(jsonpath) {
            return Err(invalid(
                "wildcards and slices address more than one location",
            ));
        }

        return Err(invalid("not a valid JSONPath expression"));
    }

    let segment = SEGMENT_RE.as_ref().map_err(|e| invalid(&e.to_string()))?;
    let mut pointer = String::new();

    for captures in segment.captures_iter(&jsonpath[1..]) {
        let key = if let Some(field) = captures.get(1).or_else(|| captures.get(3)) {
            Key::Field(field.as_str())
        } else if let Some(idx) = captures.get(2) {
            Key::Idx(
                idx.as_str()
                    .parse()
                    .map_err(|_| invalid("array index out of range"))?,
            )
        } else {
            return Err(invalid("not a valid JSONPath expression"));
        };

        pointer.push_str(&key.to_string());
    }

    Ok(pointer)
}

/// Returns `path` as a JSON Pointer, converting it first when it is written
/// as a JSONPath expression.
///
/// ```
/// use json_noise::pointer::normalize;
///
/// assert_eq!(normalize("/user/name").unwrap(), "/user/name");
/// assert_eq!(normalize("$.user.name").unwrap(), "/user/name");
/// ```
pub fn normalize(path: &str) -> Result<String, NoiseError> {
    if is_pointer(path) {
        return Ok(path.to_string());
    }

    from_jsonpath(path)
}
