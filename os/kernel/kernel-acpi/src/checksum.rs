//! Checksum and signature primitives shared by every table parser.

/// Sums the first `declared_length` bytes modulo 256.
///
/// Returns `true` iff the sum is zero. ACPI tables carry their checksum byte
/// inside the summed region, so no separate expected value is needed.
/// A `declared_length` larger than `bytes` never verifies.
#[must_use]
pub fn verify_checksum(bytes: &[u8], declared_length: usize) -> bool {
    bytes
        .get(..declared_length)
        .is_some_and(|region| sum(region) == 0)
}

/// Byte-for-byte comparison of the first `tag_len` bytes of `bytes` and `expected`.
#[must_use]
pub fn signature_matches(bytes: &[u8], expected: &[u8], tag_len: usize) -> bool {
    match (bytes.get(..tag_len), expected.get(..tag_len)) {
        (Some(found), Some(wanted)) => found == wanted,
        _ => false,
    }
}

pub(crate) fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}
