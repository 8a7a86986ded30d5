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

//! Vertex attribute pipeline
//!
//! Up to twelve attribute loaders describe how interleaved vertex data is
//! laid out in guest memory: each loader carries a byte offset into the
//! shared vertex buffer, an ordered list of attribute/padding components
//! and a total per-vertex byte count (the stride). The pipeline resolves
//! that description once per draw into a per-attribute source table, then
//! fetches and widens components per vertex index.
//!
//! # Loader registers
//!
//! Each loader occupies three consecutive registers:
//!
//! ```text
//! +0  byte offset of the loader's data inside the vertex buffer
//! +1  component nibbles 0-7
//! +2  bits 0-15: component nibbles 8-11, bits 16-23: per-vertex byte
//!     count, bits 28-31: component count
//! ```
//!
//! A component nibble below 12 assigns an attribute; 12-15 insert 4-16
//! bytes of padding. The global format registers give each attribute its
//! element format (nibble: bits 0-1 format, bits 2-3 element count - 1).
//!
//! Two loaders assigning the same attribute is undefined upstream; the
//! hardware-compatible policy implemented here is last-loader-wins.

use super::primitives::{InputVertex, MAX_ATTRIBUTES};
use super::registers::{reg, RegisterFile};
use crate::core::memory::Memory;

/// Number of attribute loaders
pub const NUM_LOADERS: usize = 12;

/// Sentinel marking a position w component no data source has written
///
/// Applications routinely omit the position's 4th component; leaving it
/// unset would corrupt perspective division downstream, so the fetch path
/// patches a still-sentinel w to 1.0. Attribute 0 is assumed to be the
/// position.
const POSITION_W_SENTINEL: u32 = 0x7FBF_00FF;

/// Element format of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    /// 8-bit signed integer
    I8,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit signed integer
    I16,
    /// 32-bit float
    F32,
}

impl AttributeFormat {
    fn decode(bits: u32) -> Self {
        match bits & 0x3 {
            0 => AttributeFormat::I8,
            1 => AttributeFormat::U8,
            2 => AttributeFormat::I16,
            _ => AttributeFormat::F32,
        }
    }

    /// Element size in bytes
    #[inline(always)]
    pub fn element_size(self) -> u32 {
        match self {
            AttributeFormat::I8 | AttributeFormat::U8 => 1,
            AttributeFormat::I16 => 2,
            AttributeFormat::F32 => 4,
        }
    }
}

/// Resolved memory source of one attribute, derived once per draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSource {
    /// Physical address of the attribute for vertex 0
    pub address: u32,

    /// Per-vertex byte stride (the owning loader's byte count)
    pub stride: u32,

    /// Element format
    pub format: AttributeFormat,

    /// Number of elements (1-4)
    pub elements: u32,
}

/// Per-draw attribute source table
///
/// Recomputing this per vertex would be correct but wasteful; the derived
/// values depend only on register state, which cannot change mid-draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeSourceTable {
    /// Source per attribute; `None` = attribute not assigned by any loader
    pub sources: [Option<AttributeSource>; MAX_ATTRIBUTES],

    /// Total attribute count configured for the shader
    pub num_attributes: usize,
}

/// Build the per-attribute source table from the loader configuration
///
/// Walks each loader's component list in order, accumulating a running
/// byte offset; later loaders overwrite earlier assignments of the same
/// attribute (last-loader-wins).
pub fn prepare_attribute_sources(regs: &RegisterFile) -> AttributeSourceTable {
    let base = regs.attribute_base();
    let format_low = regs.read(reg::ATTR_FORMAT_LOW);
    let format_high = regs.read(reg::ATTR_FORMAT_HIGH);

    let mut table = AttributeSourceTable {
        sources: [None; MAX_ATTRIBUTES],
        num_attributes: (((format_high >> 28) & 0xF) + 1) as usize,
    };

    for loader in 0..NUM_LOADERS as u16 {
        let loader_base = reg::LOADER_BASE + loader * 3;
        let data_offset = regs.read(loader_base);
        let comp_low = regs.read(loader_base + 1);
        let comp_high = regs.read(loader_base + 2);

        let byte_count = (comp_high >> 16) & 0xFF;
        let component_count = ((comp_high >> 28) & 0xF).min(12);

        let mut offset = data_offset;
        for c in 0..component_count {
            let nibble = if c < 8 {
                (comp_low >> (c * 4)) & 0xF
            } else {
                (comp_high >> ((c - 8) * 4)) & 0xF
            };

            if nibble < MAX_ATTRIBUTES as u32 {
                let format_nibble = if nibble < 8 {
                    format_low >> (nibble * 4)
                } else {
                    format_high >> ((nibble - 8) * 4)
                };
                let format = AttributeFormat::decode(format_nibble);
                let elements = ((format_nibble >> 2) & 0x3) + 1;

                table.sources[nibble as usize] = Some(AttributeSource {
                    address: base.wrapping_add(offset),
                    stride: byte_count,
                    format,
                    elements,
                });
                offset += elements * format.element_size();
            } else {
                // Padding component: 12 = 4 bytes .. 15 = 16 bytes
                offset += 4 * (nibble - 11);
            }
        }
    }

    table
}

/// Fetch and widen one vertex
///
/// Resolves `source + stride * index + element * element_size` per
/// component through address translation. A failed translation leaves the
/// component at its previous value; missing data is a soft error and the
/// draw continues.
pub fn fetch_vertex(mem: &Memory, table: &AttributeSourceTable, index: u32) -> InputVertex {
    let mut vertex = InputVertex::new();
    // Mark the position w so an unwritten one can be recognized below
    vertex.attr[0][3] = f32::from_bits(POSITION_W_SENTINEL);

    for (i, source) in table
        .sources
        .iter()
        .enumerate()
        .take(table.num_attributes)
    {
        let Some(source) = source else {
            continue;
        };

        let vertex_base = source.address.wrapping_add(source.stride.wrapping_mul(index));
        for element in 0..source.elements {
            let address = vertex_base + element * source.format.element_size();
            let value = match source.format {
                AttributeFormat::I8 => mem.read_u8(address).map(|v| v as i8 as f32),
                AttributeFormat::U8 => mem.read_u8(address).map(|v| v as f32),
                AttributeFormat::I16 => mem.read_u16(address).map(|v| v as i16 as f32),
                AttributeFormat::F32 => mem.read_f32(address),
            };
            if let Some(value) = value {
                vertex.attr[i][element as usize] = value;
            }
        }
    }

    if vertex.attr[0][3].to_bits() == POSITION_W_SENTINEL {
        // The data source never wrote a w; patch it for perspective division
        vertex.attr[0][3] = 1.0;
    }

    vertex
}

/// Read one index of the index stream
///
/// Returns 0 when the index memory is unmapped, keeping the draw alive.
pub fn read_index(mem: &Memory, address: u32, format_u16: bool, n: u32) -> u32 {
    if format_u16 {
        mem.read_u16(address + n * 2).map_or(0, u32::from)
    } else {
        mem.read_u8(address + n).map_or(0, u32::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::Memory;

    /// Point the attribute buffer base at FCRAM and configure loader 0
    fn configure_single_loader(
        regs: &mut RegisterFile,
        format_nibble: u32,
        byte_count: u32,
    ) {
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_BASE, Memory::FCRAM_START >> 3, all);
        // One attribute, format from the caller
        regs.write_masked(reg::ATTR_FORMAT_LOW, format_nibble, all);
        regs.write_masked(reg::ATTR_FORMAT_HIGH, 0, all);
        // Loader 0: offset 0, component 0, given stride, one component
        regs.write_masked(reg::LOADER_BASE, 0, all);
        regs.write_masked(reg::LOADER_BASE + 1, 0, all);
        regs.write_masked(reg::LOADER_BASE + 2, (1 << 28) | (byte_count << 16), all);
    }

    #[test]
    fn test_prepare_single_f32_attribute() {
        let mut regs = RegisterFile::new();
        // Format 3 (f32), 3 elements: nibble 0b1011
        configure_single_loader(&mut regs, 0b1011, 12);

        let table = prepare_attribute_sources(&regs);
        assert_eq!(table.num_attributes, 1);
        let source = table.sources[0].unwrap();
        assert_eq!(source.address, Memory::FCRAM_START);
        assert_eq!(source.stride, 12);
        assert_eq!(source.format, AttributeFormat::F32);
        assert_eq!(source.elements, 3);
    }

    #[test]
    fn test_running_offset_walk() {
        let mut regs = RegisterFile::new();
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_BASE, Memory::FCRAM_START >> 3, all);
        // Attribute 0: f32 x3 (nibble 0b1011), attribute 1: u8 x4 (0b1101)
        regs.write_masked(reg::ATTR_FORMAT_LOW, (0b1101 << 4) | 0b1011, all);
        regs.write_masked(reg::ATTR_FORMAT_HIGH, 1 << 28, all); // 2 attributes
        // Loader 0 carries both, 16 bytes per vertex
        regs.write_masked(reg::LOADER_BASE, 0, all);
        regs.write_masked(reg::LOADER_BASE + 1, 0x10, all); // components 0, 1
        regs.write_masked(reg::LOADER_BASE + 2, (2 << 28) | (16 << 16), all);

        let table = prepare_attribute_sources(&regs);
        let a0 = table.sources[0].unwrap();
        let a1 = table.sources[1].unwrap();
        assert_eq!(a0.address, Memory::FCRAM_START);
        // Attribute 1 starts after attribute 0's 12 bytes
        assert_eq!(a1.address, Memory::FCRAM_START + 12);
        assert_eq!(a1.format, AttributeFormat::U8);
        assert_eq!(a1.elements, 4);
        assert_eq!(a0.stride, 16);
        assert_eq!(a1.stride, 16);
    }

    #[test]
    fn test_padding_components_advance_offset() {
        let mut regs = RegisterFile::new();
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_BASE, Memory::FCRAM_START >> 3, all);
        regs.write_masked(reg::ATTR_FORMAT_LOW, 0b1011, all); // f32 x3
        // Loader 0: 8 bytes padding (nibble 13) then attribute 0
        regs.write_masked(reg::LOADER_BASE + 1, 0x0D | (0 << 4), all);
        regs.write_masked(reg::LOADER_BASE + 2, (2 << 28) | (20 << 16), all);

        let table = prepare_attribute_sources(&regs);
        assert_eq!(table.sources[0].unwrap().address, Memory::FCRAM_START + 8);
    }

    #[test]
    fn test_last_loader_wins() {
        let mut regs = RegisterFile::new();
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_BASE, Memory::FCRAM_START >> 3, all);
        regs.write_masked(reg::ATTR_FORMAT_LOW, 0b1011, all);
        // Loader 0 assigns attribute 0 at offset 0
        regs.write_masked(reg::LOADER_BASE, 0, all);
        regs.write_masked(reg::LOADER_BASE + 1, 0, all);
        regs.write_masked(reg::LOADER_BASE + 2, (1 << 28) | (12 << 16), all);
        // Loader 1 assigns it again at offset 0x100
        regs.write_masked(reg::LOADER_BASE + 3, 0x100, all);
        regs.write_masked(reg::LOADER_BASE + 4, 0, all);
        regs.write_masked(reg::LOADER_BASE + 5, (1 << 28) | (12 << 16), all);

        let table = prepare_attribute_sources(&regs);
        assert_eq!(
            table.sources[0].unwrap().address,
            Memory::FCRAM_START + 0x100
        );
    }

    #[test]
    fn test_fetch_widens_formats() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        // i8 x2: format 0, elements 2 -> nibble 0b0100
        configure_single_loader(&mut regs, 0b0100, 2);
        mem.load_image(Memory::FCRAM_START, &[0xFEu8, 0x7F]).unwrap();

        let table = prepare_attribute_sources(&regs);
        let v = fetch_vertex(&mem, &table, 0);
        assert_eq!(v.attr[0][0], -2.0);
        assert_eq!(v.attr[0][1], 127.0);
    }

    #[test]
    fn test_fetch_strides_by_vertex_index() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        // f32 x1, stride 4
        configure_single_loader(&mut regs, 0b0011, 4);
        mem.write_f32(Memory::FCRAM_START, 10.0);
        mem.write_f32(Memory::FCRAM_START + 4, 20.0);
        mem.write_f32(Memory::FCRAM_START + 8, 30.0);

        let table = prepare_attribute_sources(&regs);
        assert_eq!(fetch_vertex(&mem, &table, 0).attr[0][0], 10.0);
        assert_eq!(fetch_vertex(&mem, &table, 2).attr[0][0], 30.0);
    }

    #[test]
    fn test_missing_position_w_defaults_to_one() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        // Position as f32 x3: the data never supplies a w
        configure_single_loader(&mut regs, 0b1011, 12);
        mem.write_f32(Memory::FCRAM_START, 1.0);
        mem.write_f32(Memory::FCRAM_START + 4, 2.0);
        mem.write_f32(Memory::FCRAM_START + 8, 3.0);

        let table = prepare_attribute_sources(&regs);
        let v = fetch_vertex(&mem, &table, 0);
        assert_eq!(v.attr[0], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_position_w_kept_when_fetched() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        // f32 x4: the buffer carries an explicit w
        configure_single_loader(&mut regs, 0b1111, 16);
        for (i, value) in [1.0f32, 2.0, 3.0, 0.5].iter().enumerate() {
            mem.write_f32(Memory::FCRAM_START + i as u32 * 4, *value);
        }

        let table = prepare_attribute_sources(&regs);
        let v = fetch_vertex(&mem, &table, 0);
        assert_eq!(v.attr[0][3], 0.5);
    }

    #[test]
    fn test_unmapped_fetch_is_soft() {
        let mut regs = RegisterFile::new();
        let mem = Memory::new();
        configure_single_loader(&mut regs, 0b1011, 12);
        // Point the buffer at unmapped memory
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_BASE, 0, all);

        let table = prepare_attribute_sources(&regs);
        let v = fetch_vertex(&mem, &table, 0);
        // Components untouched; the position w patch still applies
        assert_eq!(v.attr[0], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unassigned_attribute_reads_default() {
        let mut regs = RegisterFile::new();
        let mem = Memory::new();
        configure_single_loader(&mut regs, 0b1011, 12);
        // Two attributes configured, but only attribute 0 has a loader
        let all = 0xFFFF_FFFF;
        regs.write_masked(reg::ATTR_FORMAT_HIGH, 1 << 28, all);

        let table = prepare_attribute_sources(&regs);
        let v = fetch_vertex(&mem, &table, 0);
        assert_eq!(v.attr[1], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_read_index_formats() {
        let mut mem = Memory::new();
        mem.load_image(Memory::FCRAM_START, &[5u8, 6, 7, 8]).unwrap();
        assert_eq!(read_index(&mem, Memory::FCRAM_START, false, 2), 7);
        assert_eq!(read_index(&mem, Memory::FCRAM_START, true, 1), 0x0807);
        // Unmapped index memory reads as 0
        assert_eq!(read_index(&mem, 0, false, 0), 0);
    }
}
