//! Compact difficulty targets and chainwork proofs.
//!
//! The compact form packs a 256-bit target into 32 bits as
//! `exponent:8 | sign:1 | mantissa:23`. Storing the proof
//! `(1 << 256) / (target + 1)` inline with each chain entry lets a
//! restart recover cumulative chainwork without rescanning the chain.

use nomen_primitives::Hash;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Expand a compact target. Returns the magnitude and the sign bit;
/// a zero compact maps to a zero target.
pub fn compact_to_target(bits: u32) -> (BigUint, bool) {
    let exponent = bits >> 24;
    let negative = (bits >> 23) & 1 == 1;
    let mantissa = bits & 0x007f_ffff;

    let value = if exponent <= 3 {
        BigUint::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigUint::from(mantissa) << (8 * (exponent - 3))
    };

    let negative = negative && !value.is_zero();
    (value, negative)
}

/// Pack a target into compact form. If the leading byte would set the
/// sign bit, the mantissa shifts right one byte and the exponent grows.
pub fn target_to_compact(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let bytes = target.to_bytes_be();
    let mut size = bytes.len();
    let mut word: u32 = if size <= 3 {
        let mut w = 0u32;
        for &b in &bytes {
            w = (w << 8) | b as u32;
        }
        w << (8 * (3 - size))
    } else {
        ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32)
    };

    if word & 0x0080_0000 != 0 {
        word >>= 8;
        size += 1;
    }

    ((size as u32) << 24) | word
}

/// Check a block hash against a compact target: the target must be
/// positive and fit in 256 bits, and the hash read big-endian must not
/// exceed it.
pub fn verify_pow(hash: &Hash, bits: u32) -> bool {
    let (target, negative) = compact_to_target(bits);
    if negative || target.is_zero() || target.bits() > 256 {
        return false;
    }
    BigUint::from_bytes_be(hash.as_bytes()) <= target
}

/// Work represented by a compact target: `(1 << 256) / (target + 1)`,
/// zero for a non-positive target.
pub fn get_proof(bits: u32) -> BigUint {
    let (target, negative) = compact_to_target(bits);
    if negative || target.is_zero() {
        return BigUint::zero();
    }
    (BigUint::one() << 256u32) / (target + BigUint::one())
}

/// Test a version-bit signal.
pub fn has_bit(version: u32, bit: u8) -> bool {
    (version >> bit) & 1 == 1
}
