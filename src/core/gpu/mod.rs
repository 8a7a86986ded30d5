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

//! GPU front end
//!
//! This module implements the command-and-shader front end of the PICA-class
//! graphics processor:
//!
//! - decoding the packed register command stream into masked writes
//!   ([`commands`])
//! - the flat register file and its structured views ([`registers`])
//! - reconstructing per-vertex input data from the attribute loader
//!   configuration ([`vertex`])
//! - grouping shaded vertices into triangles ([`assembler`])
//!
//! # Execution model
//!
//! Everything is single-threaded and synchronous: a draw-trigger register
//! write runs the whole vertex pipeline inside the caller's stack before
//! returning. Nothing here is re-entrant, and nothing suspends.
//!
//! # Collaborators
//!
//! The core stays renderer-agnostic. Per call it borrows a
//! [`GpuContext`]: emulated [`Memory`] for fetches, the
//! [`InterruptController`] for the IRQ-trigger register, a [`Renderer`]
//! that receives triangles and translated shader programs, a
//! [`VertexShaderRunner`] (the host's shader interpreter) and optional
//! [`DebugHooks`].
//!
//! # References
//!
//! - [3dbrew: GPU registers](https://www.3dbrew.org/wiki/GPU/Internal_Registers)
//! - [3dbrew: shader instruction set](https://www.3dbrew.org/wiki/Shader_Instruction_Set)

use crate::core::interrupt::InterruptController;
use crate::core::memory::Memory;
use crate::core::shader::translator::TranslatorOptions;
use crate::core::shader::ShaderUnit;

// Module declarations
mod assembler;
mod commands;
mod debug;
mod primitives;
mod registers;
mod vertex;

// Public re-exports
pub use assembler::PrimitiveAssembler;
pub use commands::CommandHeader;
pub use debug::DebugHooks;
pub use primitives::{InputVertex, OutputVertex, MAX_ATTRIBUTES, NUM_INPUT_REGISTERS};
pub use registers::{
    reg, AlphaTest, BlendConfig, CullMode, DepthColorMask, IndexArrayConfig, RegisterFile,
    TextureConfig, Topology, NUM_REGISTERS,
};
pub use vertex::{
    fetch_vertex, prepare_attribute_sources, AttributeFormat, AttributeSource,
    AttributeSourceTable, NUM_LOADERS,
};

/// Renderer collaborator
///
/// The only way geometry and shader programs leave the core. Whatever
/// sits behind it (a clipper, a hardware submission queue) is none of the
/// front end's business.
pub trait Renderer {
    /// One assembled triangle, in submission order
    fn submit_triangle(&mut self, v0: &OutputVertex, v1: &OutputVertex, v2: &OutputVertex);

    /// A freshly translated GLSL vertex program
    ///
    /// Called at most once per distinct shader binary, right before the
    /// first draw that uses it. The default ignores it (software-shading
    /// backends have no use for the text).
    fn upload_shader_program(&mut self, _glsl: &str) {}
}

/// Shader execution collaborator
///
/// The per-instruction shader interpreter lives outside this crate; the
/// draw loop only needs something that maps an input vertex to an output
/// vertex under the current shader unit state.
pub trait VertexShaderRunner {
    /// Shade one vertex
    fn run_vertex(&mut self, unit: &ShaderUnit, input: &InputVertex) -> OutputVertex;
}

/// Per-call collaborator bundle
///
/// A draw holds the context exclusively for its whole run, so nothing
/// reached through it can re-enter the command processor.
pub struct GpuContext<'a> {
    /// Emulated physical memory for attribute and index fetches
    pub mem: &'a Memory,

    /// Interrupt controller receiving the IRQ-trigger side effect
    pub irq: &'a mut InterruptController,

    /// Renderer receiving triangles and shader programs
    pub renderer: &'a mut dyn Renderer,

    /// Host shader interpreter
    pub vertex_shader: &'a mut dyn VertexShaderRunner,

    /// Optional instrumentation observer
    pub hooks: Option<&'a mut dyn DebugHooks>,
}

/// GPU front end state
///
/// Owns the register file and the shader unit; everything external is
/// borrowed per call through [`GpuContext`].
///
/// # Examples
///
/// ```
/// use ctrx::core::gpu::{reg, CommandHeader, Gpu, GpuContext, OutputVertex, Renderer,
///     VertexShaderRunner, InputVertex};
/// use ctrx::core::interrupt::InterruptController;
/// use ctrx::core::memory::Memory;
/// use ctrx::core::shader::ShaderUnit;
///
/// struct NullRenderer;
/// impl Renderer for NullRenderer {
///     fn submit_triangle(&mut self, _: &OutputVertex, _: &OutputVertex, _: &OutputVertex) {}
/// }
/// struct NullRunner;
/// impl VertexShaderRunner for NullRunner {
///     fn run_vertex(&mut self, _: &ShaderUnit, _: &InputVertex) -> OutputVertex {
///         OutputVertex::default()
///     }
/// }
///
/// let mut gpu = Gpu::new();
/// let mem = Memory::new();
/// let mut irq = InterruptController::new();
/// let (mut renderer, mut runner) = (NullRenderer, NullRunner);
/// let mut ctx = GpuContext {
///     mem: &mem,
///     irq: &mut irq,
///     renderer: &mut renderer,
///     vertex_shader: &mut runner,
///     hooks: None,
/// };
///
/// // One masked register write: parameter word, then header word
/// let list = [0x0000_0002, CommandHeader::encode(reg::CULL_MODE, 0xF, 0, false)];
/// gpu.process_command_list(&mut ctx, &list);
/// assert_eq!(gpu.regs().read(reg::CULL_MODE), 2);
/// ```
pub struct Gpu {
    /// The flat register file
    pub(crate) regs: RegisterFile,

    /// Vertex shader unit (program, swizzles, uniforms)
    pub(crate) shader: ShaderUnit,

    /// Options forwarded to the bytecode translator
    pub(crate) translator_options: TranslatorOptions,
}

impl Gpu {
    /// Create a GPU front end in power-on state
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            shader: ShaderUnit::new(),
            translator_options: TranslatorOptions::default(),
        }
    }

    /// Reset registers and shader unit to power-on state
    ///
    /// Translator options survive a reset; they are host configuration,
    /// not hardware state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.shader.reset();
    }

    /// Read-only register file access (structured views included)
    #[inline(always)]
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Read-only shader unit access (uniforms, program memory)
    #[inline(always)]
    pub fn shader(&self) -> &ShaderUnit {
        &self.shader
    }

    /// Configure the bytecode translator
    ///
    /// The NOP-pair block-splitting workaround for legacy titles is
    /// enabled here, never by default.
    pub fn set_translator_options(&mut self, options: TranslatorOptions) {
        self.translator_options = options;
    }
}

impl Default for Gpu {
    fn default() -> Self {
        Self::new()
    }
}
