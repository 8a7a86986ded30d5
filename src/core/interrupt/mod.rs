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

//! GPU interrupt controller
//!
//! The graphics hardware raises interrupts toward the system-software layer
//! for display transfers, vertical blank and command-list completion. The
//! command processor only ever touches one of them directly: writing the
//! IRQ-trigger register raises **P3D** (3D command list done).
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit  | Source  | Description
//! -----|---------|----------------------------------
//! 0    | PSC0    | Memory fill channel 0 complete
//! 1    | PSC1    | Memory fill channel 1 complete
//! 2    | VBLANK0 | Top screen vertical blank
//! 3    | VBLANK1 | Bottom screen vertical blank
//! 4    | PPF     | Display transfer complete
//! 5    | P3D     | 3D command list complete
//! 6    | DMA     | GPU DMA complete
//! ```

use bitflags::bitflags;

bitflags! {
    /// Set of GPU interrupt sources
    ///
    /// Used both as the pending-status register and as the mask register of
    /// the controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InterruptSet: u8 {
        /// Memory fill channel 0 complete (bit 0)
        const PSC0 = 1 << 0;

        /// Memory fill channel 1 complete (bit 1)
        const PSC1 = 1 << 1;

        /// Top screen vertical blank (bit 2)
        const VBLANK0 = 1 << 2;

        /// Bottom screen vertical blank (bit 3)
        const VBLANK1 = 1 << 3;

        /// Display transfer complete (bit 4)
        const PPF = 1 << 4;

        /// 3D command list complete (bit 5)
        const P3D = 1 << 5;

        /// GPU DMA complete (bit 6)
        const DMA = 1 << 6;
    }
}

/// GPU interrupt controller
///
/// Collects interrupt requests from the graphics pipeline and exposes them
/// to the system-software layer, filtered through a mask register.
///
/// # Example
///
/// ```
/// use ctrx::core::interrupt::{InterruptController, InterruptSet};
///
/// let mut ic = InterruptController::new();
///
/// // Command processor finished a list
/// ic.request(InterruptSet::P3D);
///
/// // Enable P3D delivery
/// ic.write_mask(InterruptSet::P3D);
/// assert!(ic.is_pending());
///
/// // Acknowledge it
/// ic.acknowledge(InterruptSet::P3D);
/// assert!(!ic.is_pending());
/// ```
pub struct InterruptController {
    /// Pending interrupt sources
    ///
    /// A bit stays set until the owning subsystem acknowledges it.
    status: InterruptSet,

    /// Interrupt mask
    ///
    /// Set bit = interrupt may reach the system-software layer.
    mask: InterruptSet,
}

impl InterruptController {
    /// Create a new interrupt controller with everything cleared and masked
    pub fn new() -> Self {
        Self {
            status: InterruptSet::empty(),
            mask: InterruptSet::empty(),
        }
    }

    /// Request one or more interrupts
    ///
    /// Called by hardware components; requesting an already-pending source
    /// is a no-op, as on the real chip.
    pub fn request(&mut self, sources: InterruptSet) {
        self.status |= sources;
        log::trace!(
            "IRQ requested: {:?}, status now {:?}",
            sources,
            self.status
        );
    }

    /// Acknowledge (clear) one or more pending interrupts
    pub fn acknowledge(&mut self, sources: InterruptSet) {
        self.status -= sources;
        log::trace!("IRQ acknowledged, status now {:?}", self.status);
    }

    /// Read the pending-status set
    #[inline(always)]
    pub fn read_status(&self) -> InterruptSet {
        self.status
    }

    /// Replace the interrupt mask
    pub fn write_mask(&mut self, mask: InterruptSet) {
        self.mask = mask;
        log::debug!("IRQ mask set: {:?}", self.mask);
    }

    /// Read the interrupt mask
    #[inline(always)]
    pub fn read_mask(&self) -> InterruptSet {
        self.mask
    }

    /// Check whether any unmasked interrupt is pending
    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        !(self.status & self.mask).is_empty()
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
