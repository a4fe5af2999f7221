//! Scalar wire codec and alignment arithmetic.
//!
//! The Wayland wire format is built from 32-bit words in the host's
//! native byte order. Four scalar types exist on the wire: unsigned and
//! signed 32-bit integers, object IDs (unsigned), and a packed
//! fixed-point number:
//!
//! ```text
//! ┌──────┬───────────────────────┬────────────┐
//! │ sign │ integer magnitude     │ fraction   │
//! │ bit31│ bits 8..31 (23 bits)  │ bits 0..8  │
//! └──────┴───────────────────────┴────────────┘
//! ```
//!
//! The fraction is an eighth of a byte divided by 255, not 256 — this
//! matches the reference client, not libwayland's 24.8 encoding.
//!
//! Decoders read exactly [`WORD_SIZE`] bytes from the front of the given
//! slice; bounds checking is the caller's job (the `Reader`/`Writer`
//! cursors do it before every access).

/// Size of one protocol word in bytes.
pub const WORD_SIZE: usize = 4;

/// Size of a message header in bytes: object ID word + size/opcode word.
pub const HEADER_SIZE: usize = 2 * WORD_SIZE;

/// Decode an unsigned 32-bit integer from the first four bytes.
#[inline]
pub fn decode_uint(bytes: &[u8]) -> u32 {
    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decode a signed 32-bit integer from the first four bytes.
#[inline]
pub fn decode_int(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decode an object ID from the first four bytes.
#[inline]
pub fn decode_object(bytes: &[u8]) -> u32 {
    decode_uint(bytes)
}

/// Decode a fixed-point number from the first four bytes.
///
/// Bits 8..31 hold the integer magnitude, bit 31 the sign (two's
/// complement style: a set sign bit means `-(2^23 - magnitude)`), and
/// the low byte holds the fraction as 255ths.
pub fn decode_fixed(bytes: &[u8]) -> f64 {
    let bits = decode_int(bytes);
    let mut integer_part = (bits >> 8) & 0x7F_FFFF;

    if bits >> 31 != 0 {
        integer_part = -((1 << 23) - integer_part);
    }

    f64::from(integer_part) + f64::from(bits & 0xFF) / 255.0
}

/// Encode an unsigned 32-bit integer into the first four bytes of `out`.
#[inline]
pub fn encode_uint(value: u32, out: &mut [u8]) {
    out[..WORD_SIZE].copy_from_slice(&value.to_ne_bytes());
}

/// Encode a signed 32-bit integer into the first four bytes of `out`.
#[inline]
pub fn encode_int(value: i32, out: &mut [u8]) {
    out[..WORD_SIZE].copy_from_slice(&value.to_ne_bytes());
}

/// Encode an object ID into the first four bytes of `out`.
#[inline]
pub fn encode_object(value: u32, out: &mut [u8]) {
    encode_uint(value, out);
}

/// Encode a fixed-point number into the first four bytes of `out`.
///
/// Inverse of [`decode_fixed`]. Values outside `[-(2^23), 2^23)` are
/// clamped to the representable range.
pub fn encode_fixed(value: f64, out: &mut [u8]) {
    const MAX: f64 = (1 << 23) as f64;
    let clamped = value.clamp(-MAX, MAX - 1.0 / 255.0);

    let floor = clamped.floor();
    let fraction = ((clamped - floor) * 255.0).round() as i32;

    let integer_part = floor as i32;
    let bits = if integer_part < 0 {
        (1i32 << 31) | ((((1 << 23) + integer_part) & 0x7F_FFFF) << 8) | fraction
    } else {
        ((integer_part & 0x7F_FFFF) << 8) | fraction
    };

    encode_int(bits, out);
}

/// Round `n` up to a multiple of four.
///
/// Reproduces the reference formula `(n - 1) - ((n - 1) % 4) + 4` with
/// 32-bit wrapping arithmetic, so `align4(0) == 0` (wraparound) and a
/// value already aligned maps to itself. Every wire length calculation
/// in the crate goes through this.
#[inline]
pub fn align4(n: u32) -> u32 {
    let m = n.wrapping_sub(1);
    (m - m % WORD_SIZE as u32).wrapping_add(WORD_SIZE as u32)
}

/// Whether `n` is a multiple of the word size.
#[inline]
pub fn is_aligned(n: u32) -> bool {
    n % WORD_SIZE as u32 == 0
}

/// Pack a message size and opcode into the header's second word.
///
/// Size occupies the high 16 bits, opcode the low 16.
#[inline]
pub fn pack_header_word(size: u16, opcode: u16) -> u32 {
    (u32::from(size) << 16) | u32::from(opcode)
}

/// Unpack the header's second word into `(size, opcode)`.
#[inline]
pub fn unpack_header_word(word: u32) -> (u16, u16) {
    ((word >> 16) as u16, (word & 0xFFFF) as u16)
}
