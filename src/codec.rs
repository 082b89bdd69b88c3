//! Two's-complement codec for register and conversion data.
//!
//! All byte sequences are big-endian. Widths are expressed in bits and must lie in `1..=32`;
//! the byte length of a sequence is always `bit_width.div_ceil(8)`.

use crate::error::ProtocolError;

/// Width of ADS1248 conversion codes and calibration words, and of RM3100 axis results.
pub const WORD_BITS: u32 = 24;
/// Byte length of a 24-bit word.
pub const WORD_BYTES: usize = 3;

const MAX_BITS: u32 = 32;

/// Smallest value representable in `bit_width` bits, or `None` outside `1..=32`.
pub const fn signed_min(bit_width: u32) -> Option<i64> {
    if bit_width == 0 || bit_width > MAX_BITS {
        return None;
    }
    Some(-(1i64 << (bit_width - 1)))
}

/// Largest value representable in `bit_width` bits, or `None` outside `1..=32`.
pub const fn signed_max(bit_width: u32) -> Option<i64> {
    if bit_width == 0 || bit_width > MAX_BITS {
        return None;
    }
    Some((1i64 << (bit_width - 1)) - 1)
}

fn bounds(bit_width: u32) -> Result<(i64, i64), ProtocolError> {
    match (signed_min(bit_width), signed_max(bit_width)) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(ProtocolError::Range),
    }
}

fn check_width(bit_width: u32, len: usize) -> Result<(), ProtocolError> {
    if bit_width == 0 || bit_width > MAX_BITS {
        return Err(ProtocolError::Range);
    }
    if len != bit_width.div_ceil(8) as usize {
        return Err(ProtocolError::Range);
    }
    Ok(())
}

/// Interprets `bytes` as a `bit_width`-bit two's-complement integer.
///
/// Bits above `bit_width` in the leading byte must be clear.
pub fn decode_signed(bytes: &[u8], bit_width: u32) -> Result<i32, ProtocolError> {
    check_width(bit_width, bytes.len())?;

    let raw = bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
    if raw >> bit_width != 0 {
        return Err(ProtocolError::Range);
    }

    let value = if raw & (1 << (bit_width - 1)) != 0 {
        raw as i64 - (1i64 << bit_width)
    } else {
        raw as i64
    };
    Ok(value as i32)
}

/// Encodes `value` as a `bit_width`-bit two's-complement integer into `out`.
///
/// Values outside `[-2^(bit_width-1), 2^(bit_width-1) - 1]` are rejected.
pub fn encode_signed(value: i32, bit_width: u32, out: &mut [u8]) -> Result<(), ProtocolError> {
    check_width(bit_width, out.len())?;
    let (min, max) = bounds(bit_width)?;

    let wide = i64::from(value);
    if wide < min || wide > max {
        return Err(ProtocolError::Range);
    }

    let mut raw = (wide as u64) & ((1u64 << bit_width) - 1);
    for byte in out.iter_mut().rev() {
        *byte = (raw & 0xFF) as u8;
        raw >>= 8;
    }
    Ok(())
}

/// Decodes a 24-bit big-endian word.
pub fn decode_i24(bytes: [u8; WORD_BYTES]) -> i32 {
    // Sign-extend through the top byte of an i32.
    i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]) << 8 >> 8
}

/// Encodes a 24-bit big-endian word, rejecting values outside `[-0x800000, 0x7FFFFF]`.
pub fn encode_i24(value: i32) -> Result<[u8; WORD_BYTES], ProtocolError> {
    let mut out = [0u8; WORD_BYTES];
    encode_signed(value, WORD_BITS, &mut out)?;
    Ok(out)
}

/// Scales a signed code by `scale`, e.g. `0x400000` for ADS1248 gain words.
pub fn decode_fraction(code: i32, bit_width: u32, scale: i32) -> Result<f32, ProtocolError> {
    let (min, max) = bounds(bit_width)?;
    if scale == 0 {
        return Err(ProtocolError::Range);
    }
    let wide = i64::from(code);
    if wide < min || wide > max {
        return Err(ProtocolError::Range);
    }
    Ok(code as f32 / scale as f32)
}

/// Converts a fraction back into a signed code, truncating toward zero.
pub fn encode_fraction(value: f32, bit_width: u32, scale: i32) -> Result<i32, ProtocolError> {
    let (min, max) = bounds(bit_width)?;
    if scale == 0 || !value.is_finite() {
        return Err(ProtocolError::Range);
    }
    let scaled = value as f64 * scale as f64;
    if scaled < min as f64 || scaled >= (max + 1) as f64 {
        return Err(ProtocolError::Range);
    }
    Ok(scaled as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ones_decodes_to_minus_one() {
        assert_eq!(decode_signed(&[0xFF, 0xFF, 0xFF], 24), Ok(-1));
        assert_eq!(decode_i24([0xFF, 0xFF, 0xFF]), -1);
    }

    #[test]
    fn sign_boundary_folds_at_two_pow_23() {
        assert_eq!(decode_signed(&[0x7F, 0xFF, 0xFF], 24), Ok(0x7F_FFFF));
        assert_eq!(decode_signed(&[0x80, 0x00, 0x00], 24), Ok(-0x80_0000));
        assert_eq!(decode_i24([0x80, 0x00, 0x00]), -0x80_0000);
        assert_eq!(decode_i24([0x00, 0x00, 0x03]), 3);
    }

    #[test]
    fn round_trip_across_the_24_bit_range() {
        for value in -0x80_0000..=0x7F_FFFF {
            let bytes = encode_i24(value).unwrap();
            assert_eq!(decode_signed(&bytes, 24), Ok(value));
            assert_eq!(decode_i24(bytes), value);
        }
    }

    #[test]
    fn width_bounds_reject_zero_and_oversized_widths() {
        assert_eq!(signed_min(0), None);
        assert_eq!(signed_max(33), None);
        assert_eq!(signed_min(24), Some(-0x80_0000));
        assert_eq!(signed_max(32), Some(i64::from(i32::MAX)));
        assert_eq!(decode_fraction(1, 0, 1), Err(ProtocolError::Range));
        assert_eq!(encode_fraction(0.5, 0, 2), Err(ProtocolError::Range));
    }

    #[test]
    fn encode_rejects_values_outside_24_bits() {
        for value in [0x80_0000, -0x80_0001, 0x8F_FFFF, -0x8F_FFFF, i32::MAX, i32::MIN] {
            assert_eq!(encode_i24(value), Err(ProtocolError::Range));
        }
    }

    #[test]
    fn encode_produces_big_endian_twos_complement() {
        assert_eq!(encode_i24(-2), Ok([0xFF, 0xFF, 0xFE]));
        assert_eq!(encode_i24(0x01_0203), Ok([0x01, 0x02, 0x03]));

        let mut out = [0u8; 2];
        encode_signed(-1, 12, &mut out).unwrap();
        assert_eq!(out, [0x0F, 0xFF]);
    }

    #[test]
    fn narrow_widths_reject_stray_high_bits() {
        assert_eq!(decode_signed(&[0x0F, 0xFF], 12), Ok(-1));
        assert_eq!(decode_signed(&[0x1F, 0xFF], 12), Err(ProtocolError::Range));
    }

    #[test]
    fn byte_length_must_match_width() {
        assert_eq!(decode_signed(&[0xFF, 0xFF], 24), Err(ProtocolError::Range));
        assert_eq!(decode_signed(&[], 0), Err(ProtocolError::Range));
        let mut out = [0u8; 4];
        assert_eq!(encode_signed(1, 24, &mut out), Err(ProtocolError::Range));
    }

    #[test]
    fn gain_fraction_uses_the_declared_scale() {
        assert_eq!(decode_fraction(0x40_0000, 24, 0x40_0000), Ok(1.0));
        assert_eq!(decode_fraction(-0x20_0000, 24, 0x40_0000), Ok(-0.5));
        assert_eq!(decode_fraction(0x80_0000, 24, 0x40_0000), Err(ProtocolError::Range));
        assert_eq!(decode_fraction(1, 24, 0), Err(ProtocolError::Range));

        assert_eq!(encode_fraction(1.0, 24, 0x40_0000), Ok(0x40_0000));
        assert_eq!(encode_fraction(-2.0, 24, 0x40_0000), Ok(-0x80_0000));
        assert_eq!(encode_fraction(2.0, 24, 0x40_0000), Err(ProtocolError::Range));
        assert_eq!(encode_fraction(f32::NAN, 24, 0x40_0000), Err(ProtocolError::Range));
    }
}
