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

//! Crate-wide error type
//!
//! The hardware emulation itself never surfaces errors: the real chip has no
//! software-visible error reporting, so out-of-range register writes are
//! dropped, unmapped fetches read as zero, and malformed shader words become
//! no-ops. [`EmulatorError`] exists for the crate surface around it:
//! loading memory images, reading shader dumps from disk in the CLI tool.

use thiserror::Error;

/// Result type alias used throughout the crate surface
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Errors reported by fallible crate-surface operations
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// Underlying I/O failure (file loading in the CLI tool)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A memory image does not fit inside a mapped region
    #[error("memory image of {size} bytes does not fit at physical address {address:#010X}")]
    MemoryImage {
        /// Requested physical load address
        address: u32,
        /// Image size in bytes
        size: usize,
    },

    /// A shader dump file is not a whole number of 32-bit words
    #[error("invalid shader dump: {0}")]
    ShaderDump(String),
}
