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

//! Register command processor
//!
//! The CPU side drives the GPU by submitting command lists: packed
//! sequences of masked register writes. Each command block is a parameter
//! word followed by a header word, then `extra_data_length` further
//! parameter words, padded to 8-byte alignment:
//!
//! ```text
//! Word 0: first parameter
//! Word 1: | group (1) | extra_data_length (11) | byte mask (4) | register id (16) |
//! Word 2+: extra parameters
//! ```
//!
//! The byte-mask nibble enables one byte lane per bit. With the group
//! flag set, extra parameters target consecutive register ids; clear, they
//! rewrite the same id. Register writes with side effects (draw triggers,
//! uniform streaming, shader upload, interrupt request) dispatch from
//! [`Gpu::write_register`].

use std::collections::HashMap;

use super::assembler::PrimitiveAssembler;
use super::registers::{reg, NUM_REGISTERS};
use super::vertex;
use super::{Gpu, GpuContext};
use crate::core::interrupt::InterruptSet;
use crate::core::shader::translator;

/// One decoded command block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader(pub u32);

impl CommandHeader {
    /// Build a header word (tooling and tests)
    pub fn encode(id: u16, byte_mask: u32, extra_data_length: u32, group: bool) -> u32 {
        u32::from(id)
            | ((byte_mask & 0xF) << 16)
            | ((extra_data_length & 0x7FF) << 20)
            | ((group as u32) << 31)
    }

    /// Target register id (bits 0-15)
    #[inline(always)]
    pub fn id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Byte-enable nibble (bits 16-19)
    #[inline(always)]
    pub fn byte_mask(self) -> u32 {
        (self.0 >> 16) & 0xF
    }

    /// Number of extra parameter words (bits 20-30)
    #[inline(always)]
    pub fn extra_data_length(self) -> usize {
        ((self.0 >> 20) & 0x7FF) as usize
    }

    /// Extra parameters address consecutive registers (bit 31)
    #[inline(always)]
    pub fn group_commands(self) -> bool {
        self.0 >> 31 != 0
    }
}

/// Expand the 4-bit byte-enable nibble into a 32-bit write mask
///
/// Each set bit enables one byte lane (0xFF).
#[inline(always)]
fn expand_byte_mask(nibble: u32) -> u32 {
    let mut mask = 0;
    for lane in 0..4 {
        if nibble & (1 << lane) != 0 {
            mask |= 0xFF << (lane * 8);
        }
    }
    mask
}

impl Gpu {
    /// Process a whole command list
    ///
    /// Decodes blocks until the buffer is exhausted. A trailing fragment
    /// too short to hold a parameter-plus-header pair is ignored, matching
    /// the 8-byte block granularity of the hardware.
    pub fn process_command_list(&mut self, ctx: &mut GpuContext<'_>, words: &[u32]) {
        let mut cursor = 0;
        while cursor + 2 <= words.len() {
            cursor += self.execute_command_block(ctx, &words[cursor..]);
        }
    }

    /// Decode and apply one command block
    ///
    /// Returns the number of words consumed, rounded up so the stream
    /// stays 8-byte aligned. Only `extra_data_length` decides the
    /// consumption; parameters past the end of `block` are dropped, never
    /// read out of bounds.
    pub fn execute_command_block(&mut self, ctx: &mut GpuContext<'_>, block: &[u32]) -> usize {
        let header = CommandHeader(block[1]);
        let id = header.id();
        let mask = expand_byte_mask(header.byte_mask());

        self.write_register(ctx, id, block[0], mask);

        let extra = header.extra_data_length();
        for i in 0..extra {
            let Some(&word) = block.get(2 + i) else {
                break;
            };
            let target = if header.group_commands() {
                id.wrapping_add(i as u16 + 1)
            } else {
                id
            };
            self.write_register(ctx, target, word, mask);
        }

        let consumed = 2 + extra;
        consumed + (consumed & 1)
    }

    /// Apply one masked register write and dispatch its side effects
    ///
    /// Out-of-range ids are dropped silently, matching the permissive
    /// hardware. Side effects see the register value after masking.
    pub fn write_register(&mut self, ctx: &mut GpuContext<'_>, id: u16, value: u32, mask: u32) {
        if id as usize >= NUM_REGISTERS {
            log::warn!("write to out-of-range register 0x{id:03X} dropped");
            return;
        }

        if let Some(hooks) = ctx.hooks.as_deref_mut() {
            hooks.on_register_write(id, value, mask);
        }
        log::trace!("reg[0x{id:03X}] <- 0x{value:08X} (mask 0x{mask:08X})");

        self.regs.write_masked(id, value, mask);
        let written = self.regs.read(id);

        match id {
            reg::SIGNAL_IRQ => ctx.irq.request(InterruptSet::P3D),

            reg::TRIGGER_DRAW => self.draw(ctx, false),
            reg::TRIGGER_DRAW_INDEXED => self.draw(ctx, true),

            reg::VS_BOOL_UNIFORMS => self.shader.set_bool_uniforms(written as u16),
            reg::VS_INT_UNIFORMS..=reg::VS_INT_UNIFORMS_LAST => {
                self.shader
                    .set_int_uniform((id - reg::VS_INT_UNIFORMS) as usize, written);
            }
            reg::VS_ENTRY_POINT => self.shader.set_entry_point((written & 0xFFFF) as usize),

            reg::VS_UNIFORM_INDEX => self.shader.begin_uniform_stream(written),
            reg::VS_UNIFORM_DATA..=reg::VS_UNIFORM_DATA_LAST => {
                self.shader.push_uniform_word(written);
            }

            reg::VS_PROGRAM_OFFSET => self.shader.set_program_cursor(written),
            reg::VS_PROGRAM_DATA..=reg::VS_PROGRAM_DATA_LAST => {
                self.shader.push_program_word(written);
            }
            reg::VS_SWIZZLE_OFFSET => self.shader.set_swizzle_cursor(written),
            reg::VS_SWIZZLE_DATA..=reg::VS_SWIZZLE_DATA_LAST => {
                self.shader.push_swizzle_word(written);
            }

            // Everything else is plain state; the write already landed
            _ => {}
        }
    }

    /// Run one draw synchronously: translate the shader if it changed,
    /// fetch every vertex, shade it, assemble triangles
    fn draw(&mut self, ctx: &mut GpuContext<'_>, indexed: bool) {
        let topology = self.regs.topology();
        let num_vertices = self.regs.num_vertices();
        if let Some(hooks) = ctx.hooks.as_deref_mut() {
            hooks.on_draw_begin(topology, num_vertices);
        }
        log::debug!(
            "draw{}: {} vertices, {:?}",
            if indexed { " (indexed)" } else { "" },
            num_vertices,
            topology
        );

        if self.shader.take_dirty() {
            let glsl = translator::translate_unit(&self.shader, &self.translator_options);
            ctx.renderer.upload_shader_program(&glsl);
        }

        // Derived per-draw state, computed once (register state cannot
        // change mid-draw)
        let table = vertex::prepare_attribute_sources(&self.regs);
        let index_cfg = self.regs.index_config();
        let index_base = self.regs.attribute_base().wrapping_add(index_cfg.offset);
        let vertex_offset = self.regs.vertex_offset();

        let mut assembler = PrimitiveAssembler::new(topology);
        // Per-draw cache for indexed draws; purely a fetch/shade saver
        let mut shaded_cache = HashMap::new();

        for n in 0..num_vertices {
            let index = if indexed {
                vertex::read_index(ctx.mem, index_base, index_cfg.format_u16, n)
            } else {
                vertex_offset.wrapping_add(n)
            };

            let output = if indexed {
                match shaded_cache.get(&index).copied() {
                    Some(cached) => cached,
                    None => {
                        let input = vertex::fetch_vertex(ctx.mem, &table, index);
                        if let Some(hooks) = ctx.hooks.as_deref_mut() {
                            hooks.on_vertex_loaded(index, &input);
                        }
                        let output = ctx.vertex_shader.run_vertex(&self.shader, &input);
                        shaded_cache.insert(index, output);
                        output
                    }
                }
            } else {
                let input = vertex::fetch_vertex(ctx.mem, &table, index);
                if let Some(hooks) = ctx.hooks.as_deref_mut() {
                    hooks.on_vertex_loaded(index, &input);
                }
                ctx.vertex_shader.run_vertex(&self.shader, &input)
            };

            let renderer = &mut *ctx.renderer;
            assembler.submit_vertex(output, &mut |a, b, c| renderer.submit_triangle(a, b, c));
        }

        if let Some(hooks) = ctx.hooks.as_deref_mut() {
            hooks.on_draw_end();
        }
    }
}
