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

//! Instrumentation hooks
//!
//! Tooling (command-list inspectors, frame debuggers) can observe the
//! pipeline at well-defined points without the core knowing anything about
//! it. Every method has an empty default body, so the hooks cost nothing
//! when absent and implementors override only what they watch.

use super::primitives::InputVertex;
use super::registers::Topology;

/// Observer notified at pipeline boundaries
///
/// All methods are optional; the default implementation is a no-op.
pub trait DebugHooks {
    /// A register write was decoded from the command stream
    fn on_register_write(&mut self, _id: u16, _value: u32, _mask: u32) {}

    /// A vertex finished loading, before shading
    fn on_vertex_loaded(&mut self, _index: u32, _vertex: &InputVertex) {}

    /// A draw began
    fn on_draw_begin(&mut self, _topology: Topology, _num_vertices: u32) {}

    /// A draw finished
    fn on_draw_end(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        writes: usize,
    }

    impl DebugHooks for Counter {
        fn on_register_write(&mut self, _id: u16, _value: u32, _mask: u32) {
            self.writes += 1;
        }
    }

    #[test]
    fn test_default_methods_are_no_ops() {
        let mut counter = Counter { writes: 0 };
        counter.on_draw_begin(Topology::TriangleList, 3);
        counter.on_vertex_loaded(0, &InputVertex::new());
        counter.on_draw_end();
        counter.on_register_write(0, 0, 0);
        assert_eq!(counter.writes, 1);
    }
}
