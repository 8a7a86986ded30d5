// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shader translation tool
//!
//! Reads a raw dump of shader instruction memory (and optionally swizzle
//! memory) and prints the translated GLSL program. Useful for inspecting
//! what a title's vertex shaders turn into without running the emulator.

use clap::Parser;
use ctrx::core::shader::translator::{translate, TranslatorOptions};
use ctrx::{EmulatorError, Result};
use std::path::PathBuf;

/// Translate a shader binary dump to GLSL
#[derive(Parser)]
#[command(name = "ctrx-shadertool", version, about)]
struct Args {
    /// Raw little-endian dump of shader instruction memory
    program: PathBuf,

    /// Raw little-endian dump of swizzle-pattern memory
    #[arg(short, long)]
    swizzles: Option<PathBuf>,

    /// Program entry offset (instruction index)
    #[arg(short, long, default_value_t = 0)]
    entry: usize,

    /// Enable the legacy NOP-pair block-splitting heuristic
    #[arg(long)]
    nop_split: bool,
}

/// Load a file as little-endian 32-bit words
fn load_words(path: &PathBuf) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(EmulatorError::ShaderDump(format!(
            "{} is {} bytes, not a whole number of words",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let code = load_words(&args.program)?;
    let swizzles = match &args.swizzles {
        Some(path) => load_words(path)?,
        None => Vec::new(),
    };
    log::info!(
        "translating {} instruction words, {} swizzle words, entry 0x{:03x}",
        code.len(),
        swizzles.len(),
        args.entry
    );

    let options = TranslatorOptions {
        nop_pair_splitting: args.nop_split,
    };
    print!("{}", translate(&code, &swizzles, args.entry, &options));

    Ok(())
}
