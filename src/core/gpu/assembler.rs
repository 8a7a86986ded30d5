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

//! Primitive assembly
//!
//! Groups the shaded vertex stream into triangles according to the
//! configured topology and forwards each one to a caller-supplied
//! callback. The callback owns everything downstream (clipping,
//! rasterizer dispatch and beyond); the assembler has no opinion past
//! emission.
//!
//! Strip winding is deliberately not corrected here: alternating
//! orientation is handled upstream by the shader/hardware configuration.

use super::primitives::OutputVertex;
use super::registers::Topology;

/// Per-draw triangle assembly state machine
///
/// One instance serves exactly one draw call; construct a fresh one per
/// draw (or [`reset`](Self::reset) an old one) so no vertices leak across
/// draws.
///
/// # Example
///
/// ```
/// use ctrx::core::gpu::{OutputVertex, PrimitiveAssembler, Topology};
///
/// let mut assembler = PrimitiveAssembler::new(Topology::TriangleList);
/// let mut triangles = 0;
/// for _ in 0..6 {
///     assembler.submit_vertex(OutputVertex::default(), &mut |_, _, _| triangles += 1);
/// }
/// assert_eq!(triangles, 2);
/// ```
pub struct PrimitiveAssembler {
    topology: Topology,

    /// Vertices buffered toward the next triangle
    ///
    /// List: up to two pending corners. Strip: the previous two vertices.
    /// Fan: the pivot and the previous vertex.
    buffer: [OutputVertex; 2],

    /// Vertices submitted since the last reset (saturating past 2)
    buffered: usize,
}

impl PrimitiveAssembler {
    /// Create an assembler for one draw call
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            buffer: [OutputVertex::default(); 2],
            buffered: 0,
        }
    }

    /// Forget buffered vertices and switch topology for a new draw
    pub fn reset(&mut self, topology: Topology) {
        self.topology = topology;
        self.buffered = 0;
    }

    /// Submit one shaded vertex
    ///
    /// Invokes `triangle_callback` zero or one times, per the topology
    /// rules. Vertex order within the emitted triangle follows submission
    /// order (fan: pivot, previous, current).
    pub fn submit_vertex(
        &mut self,
        vertex: OutputVertex,
        triangle_callback: &mut dyn FnMut(&OutputVertex, &OutputVertex, &OutputVertex),
    ) {
        match self.topology {
            Topology::TriangleList => {
                if self.buffered < 2 {
                    self.buffer[self.buffered] = vertex;
                    self.buffered += 1;
                } else {
                    triangle_callback(&self.buffer[0], &self.buffer[1], &vertex);
                    self.buffered = 0;
                }
            }
            Topology::TriangleStrip => {
                if self.buffered >= 2 {
                    triangle_callback(&self.buffer[0], &self.buffer[1], &vertex);
                }
                // Slide the two-vertex window
                self.buffer[0] = self.buffer[1];
                self.buffer[1] = vertex;
                self.buffered = (self.buffered + 1).min(2);
            }
            Topology::TriangleFan => {
                match self.buffered {
                    0 => self.buffer[0] = vertex, // pivot, retained all draw
                    1 => self.buffer[1] = vertex,
                    _ => {
                        triangle_callback(&self.buffer[0], &self.buffer[1], &vertex);
                        self.buffer[1] = vertex;
                    }
                }
                self.buffered = (self.buffered + 1).min(2);
            }
        }
    }
}
