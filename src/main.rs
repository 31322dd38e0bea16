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

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use json_noise::{DiffEngine, JsonPatchEngine, NoiseModel};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        eprintln!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        eprintln!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const DETECTION_ERROR: i32 = 3;
    const REMOVAL_ERROR: i32 = 4;
    const DOCUMENTS_DIFFER: i32 = 5;
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Reference document
    primary: PathBuf,

    /// Document compared against the reference
    candidate: PathBuf,

    /// Second response to the same request as PRIMARY, used to detect noise
    #[clap(short, long)]
    secondary: Option<PathBuf>,

    /// Noisy location, as JSON Pointer (/ts) or JSONPath ($.ts)
    #[clap(short, long)]
    noise: Vec<String>,

    /// Print both documents after masking
    #[clap(short, long)]
    print: bool,

    /// Trace-level logging to stderr
    #[clap(long)]
    debug: bool,
}

#[doc(hidden)]
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[doc(hidden)]
fn read(path: &Path) -> Vec<u8> {
    match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            handle_error!(
                Code::INVALID_ARGUMENT,
                "Error: unable to read {}: {}",
                path.display(),
                err
            );
        }
    }
}

#[doc(hidden)]
fn pretty(document: &[u8]) -> String {
    serde_json::from_slice::<Value>(document)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| String::from_utf8_lossy(document).into_owned())
}

#[doc(hidden)]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut noise = NoiseModel::new();

    if let Err(err) = noise.initialize_jsonpaths(&cli.noise) {
        handle_error!(Code::INVALID_ARGUMENT, "Error: {}", err);
    }

    let primary = read(&cli.primary);
    let candidate = read(&cli.candidate);

    if let Some(secondary) = &cli.secondary {
        if let Err(err) = noise.detect(&primary, &read(secondary)) {
            handle_error!(Code::DETECTION_ERROR, "Error detecting noise: {}", err);
        }
    }

    let (primary, candidate) = match noise.remove(&primary, &candidate) {
        Ok(documents) => documents,
        Err(err) => {
            handle_error!(Code::REMOVAL_ERROR, "Error removing noise: {}", err);
        }
    };

    if cli.print {
        println!("primary:\n{}", pretty(&primary));
        println!("candidate:\n{}", pretty(&candidate));
    }

    let differences = match JsonPatchEngine.diff(&primary, &candidate) {
        Ok(differences) => differences,
        Err(err) => {
            handle_error!(Code::INTERNAL_ERROR, "Error comparing documents: {}", err);
        }
    };

    if differences.is_empty() {
        println!("documents match ({} noisy paths masked)", noise.len());
        std::process::exit(Code::SUCCESS);
    }

    println!("documents differ:");
    for difference in differences {
        println!("    {}", difference);
    }
    std::process::exit(Code::DOCUMENTS_DIFFER);
}
