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

//! 24-bit float conversion
//!
//! The shader hardware stores most values in a 24-bit floating point format:
//! 1 sign bit, 7 exponent bits (bias 63) and 16 mantissa bits. Uniform
//! streaming in packed mode delivers four of these per three 32-bit words,
//! so the command processor needs the decode direction; the encode direction
//! exists for tests and tooling.
//!
//! ```text
//! Bit 23    | Bits 16-22 | Bits 0-15
//! sign      | exponent   | mantissa
//! ```

/// Decode a raw 24-bit float (low 24 bits of `raw`) to an `f32`
///
/// The f32 format is a strict superset (8 exponent bits, 23 mantissa bits),
/// so the conversion is exact.
pub fn to_f32(raw: u32) -> f32 {
    let sign = (raw >> 23) & 1;
    let exponent = (raw >> 16) & 0x7F;
    let mantissa = raw & 0xFFFF;

    if exponent == 0x7F {
        // Infinity / NaN
        let bits = (sign << 31) | (0xFF << 23) | (mantissa << 7);
        return f32::from_bits(bits);
    }
    if exponent == 0 {
        // Zero and denormals; denormals are small enough to stay normal
        // in f32: mantissa * 2^(-16) * 2^(-62)
        let magnitude = mantissa as f32 * (-78f32).exp2();
        return if sign == 1 { -magnitude } else { magnitude };
    }

    // Rebias 63 -> 127 and widen the mantissa to 23 bits
    let bits = (sign << 31) | ((exponent + 64) << 23) | (mantissa << 7);
    f32::from_bits(bits)
}

/// Encode an `f32` into the low 24 bits of a word
///
/// Out-of-range magnitudes saturate to infinity, sub-f24-denormal
/// magnitudes flush to zero, and excess mantissa bits truncate.
pub fn from_f32(value: f32) -> u32 {
    let bits = value.to_bits();
    let sign = bits >> 31;
    let exponent = (bits >> 23) & 0xFF;
    let mantissa = (bits >> 7) & 0xFFFF;

    if exponent == 0xFF {
        // Infinity / NaN; keep a nonzero mantissa for NaN
        let m = if bits & 0x007F_FFFF != 0 { 1 } else { 0 };
        return (sign << 23) | (0x7F << 16) | m;
    }

    // Rebias 127 -> 63
    let rebased = exponent as i32 - 127 + 63;
    if rebased >= 0x7F {
        return (sign << 23) | (0x7F << 16); // saturate to infinity
    }
    if rebased <= 0 {
        return sign << 23; // flush to signed zero
    }

    (sign << 23) | ((rebased as u32) << 16) | mantissa
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(to_f32(0), 0.0);
        assert!(to_f32(0).is_sign_positive());
        assert!(to_f32(1 << 23).is_sign_negative());
        assert_eq!(to_f32(1 << 23), 0.0);
    }

    #[test]
    fn test_one() {
        // 1.0 = exponent 63 (raw), mantissa 0
        let raw = 63 << 16;
        assert_eq!(to_f32(raw), 1.0);
        assert_eq!(from_f32(1.0), raw);
    }

    #[test]
    fn test_negative_two() {
        let raw = (1 << 23) | (64 << 16);
        assert_eq!(to_f32(raw), -2.0);
        assert_eq!(from_f32(-2.0), raw);
    }

    #[test]
    fn test_fractional_value() {
        // 0.5 with a mantissa pattern survives the round trip exactly
        let value = 0.515625f32; // 0.5 + 1/64
        assert_eq!(to_f32(from_f32(value)), value);
    }

    #[test]
    fn test_round_trip_representable_values() {
        for value in [0.0f32, 1.0, -1.0, 0.25, 96.5, -1024.0, 0.000123] {
            let decoded = to_f32(from_f32(value));
            // Truncation loses at most 7 mantissa bits
            let tolerance = (value.abs() * 1e-4).max(1e-30);
            assert!(
                (decoded - value).abs() <= tolerance,
                "{value} -> {decoded}"
            );
        }
    }

    #[test]
    fn test_infinity_saturation() {
        assert_eq!(to_f32(from_f32(f32::INFINITY)), f32::INFINITY);
        // Exponent overflow saturates
        assert_eq!(to_f32(from_f32(1e30)), f32::INFINITY);
    }

    #[test]
    fn test_tiny_magnitude_flushes_to_zero() {
        assert_eq!(to_f32(from_f32(1e-30)), 0.0);
    }

    #[test]
    fn test_denormal_decode_is_finite() {
        // Smallest positive denormal: mantissa 1, exponent 0
        let tiny = to_f32(1);
        assert!(tiny > 0.0);
        assert!(tiny.is_finite());
    }
}
