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

//! Vertex data types
//!
//! [`InputVertex`] is what the attribute pipeline reconstructs from guest
//! memory and hands to the shader stage; [`OutputVertex`] is the fixed
//! post-shading record the primitive assembler groups into triangles.
//! Both are plain data with no behavior of their own.

/// Number of shader input registers a vertex can populate
pub const NUM_INPUT_REGISTERS: usize = 16;

/// Maximum number of configurable vertex attributes
pub const MAX_ATTRIBUTES: usize = 12;

/// Pre-shading vertex: one 4-component value per shader input register
///
/// Components are widened to f32 regardless of the source format.
/// Unassigned attributes read as (0, 0, 0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputVertex {
    /// Attribute values, indexed by shader input register
    pub attr: [[f32; 4]; NUM_INPUT_REGISTERS],
}

impl InputVertex {
    /// Create an input vertex with every attribute at the default
    /// (0, 0, 0, 1)
    pub fn new() -> Self {
        Self {
            attr: [[0.0, 0.0, 0.0, 1.0]; NUM_INPUT_REGISTERS],
        }
    }
}

impl Default for InputVertex {
    fn default() -> Self {
        Self::new()
    }
}

/// Post-shading vertex consumed by the primitive assembler
///
/// Created per vertex and discarded after triangle emission; nothing in
/// the pipeline retains it across draws.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputVertex {
    /// Clip-space position
    pub position: [f32; 4],

    /// Vertex color (RGBA)
    pub color: [f32; 4],

    /// Up to three texture coordinate pairs
    pub texcoords: [[f32; 2]; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_vertex_defaults() {
        let v = InputVertex::new();
        for attr in &v.attr {
            assert_eq!(*attr, [0.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_output_vertex_is_zeroed() {
        let v = OutputVertex::default();
        assert_eq!(v.position, [0.0; 4]);
        assert_eq!(v.color, [0.0; 4]);
        assert_eq!(v.texcoords, [[0.0; 2]; 3]);
    }
}
