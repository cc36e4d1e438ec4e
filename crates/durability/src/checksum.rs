//! CRC32 (IEEE 802.3, polynomial `0xEDB88320`) over a byte range
//!
//! This is a pure function: same input, same output, no state retained
//! between calls. `crc32fast` builds and caches its lookup table internally,
//! so this is a thin wrapper rather than a hand-rolled table, matching how
//! the rest of this workspace computes record and snapshot checksums.

/// Compute the IEEE 802.3 CRC32 of `bytes`.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
