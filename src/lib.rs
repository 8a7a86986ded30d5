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

//! ctrx: a PICA-class GPU command/shader front end
//!
//! This crate emulates the command-and-shader front end of the 3DS (CTR)
//! graphics processor: it decodes the packed register command stream, keeps
//! the GPU register file, rebuilds per-vertex input data from the attribute
//! loader configuration, assembles shaded vertices into triangles, and
//! translates vertex shader bytecode into GLSL for a host renderer.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`core`]: Core emulation components (GPU, Shader, Memory, Interrupts)
//!
//! # Example
//!
//! ```
//! use ctrx::core::gpu::Gpu;
//!
//! let mut gpu = Gpu::new();
//! gpu.reset();
//! ```
//!
//! # Getting Started
//!
//! 1. Create a [`core::gpu::Gpu`] instance
//! 2. Build a [`core::gpu::GpuContext`] around the emulator's memory,
//!    interrupt controller, renderer backend and vertex shader runner
//! 3. Feed command lists through [`core::gpu::Gpu::process_command_list`]
//!
//! # Modules
//!
//! - [`core::gpu`]: Register file, command processor, vertex pipeline,
//!   primitive assembly
//! - [`core::shader`]: Shader unit state and the bytecode-to-GLSL translator
//! - [`core::memory`]: Emulated physical memory and address translation
//! - [`core::interrupt`]: GPU interrupt controller
//!
//! # Error Handling
//!
//! Hardware-facing paths fail silently the way the real chip does (dropped
//! writes, zeroed fetches); fallible crate-surface operations return
//! [`core::error::Result<T>`] which is an alias for
//! `Result<T, EmulatorError>`.

pub mod core;

// Re-export commonly used types
pub use crate::core::error::{EmulatorError, Result};
