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

//! Core emulation components
//!
//! This module contains the hardware-behavior emulation:
//!
//! - [`gpu`]: Register file, command processor, vertex attribute pipeline
//!   and primitive assembly
//! - [`shader`]: Vertex shader unit state and the bytecode-to-GLSL
//!   translator
//! - [`memory`]: Emulated physical memory regions and address translation
//! - [`interrupt`]: GPU interrupt controller
//! - [`error`]: Crate-wide error type

pub mod error;
pub mod gpu;
pub mod interrupt;
pub mod memory;
pub mod shader;

// Re-export the central types
pub use gpu::Gpu;
pub use interrupt::InterruptController;
pub use memory::Memory;
