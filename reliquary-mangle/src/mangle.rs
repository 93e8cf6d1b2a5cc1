//! Deterministic name mangling: UTF-16 bytes → SHA-256 → 64-bit FNV fold →
//! truncated unpadded Base64.
//!
//! This is bit-exact with the source tool's own algorithm, which is *not*
//! textbook per-byte FNV-1a: the fold consumes the digest eight 32-bit words
//! at a time, XOR-ing in the whole residual word at each of four rounds
//! rather than one isolated byte. Reproducing the per-word shape (not a
//! simplified per-byte hash) is required for the mangle/demangle contract
//! to round-trip against real on-disk names.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

const FNV_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Number of characters in a single mangled segment.
pub const MANGLE_SEGMENT_LEN: usize = 5;

fn fold_digest(digest: [u8; 32]) -> u64 {
    let mut fnv = FNV_OFFSET_BASIS;
    for word_bytes in digest.chunks_exact(4) {
        let mut word = u32::from_le_bytes(word_bytes.try_into().unwrap());
        for _ in 0..4 {
            fnv = (fnv ^ word as u64).wrapping_mul(FNV_PRIME);
            word >>= 8;
        }
    }
    fnv
}

/// Mangles a single name segment into its 5-character on-disk form.
///
/// Deterministic and pure: the same `name` always mangles to the same
/// output, with no dependency on locale, time, or prior calls.
pub fn mangle_segment(name: &str) -> String {
    let utf16: Vec<u16> = name.encode_utf16().collect();
    let mut bytes = Vec::with_capacity(utf16.len() * 2);
    for unit in utf16 {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    let folded = fold_digest(digest);
    let encoded = STANDARD_NO_PAD.encode(folded.to_le_bytes());
    encoded[..MANGLE_SEGMENT_LEN].to_owned()
}

/// Mangles a full dotted name (`"parent.leaf"`) into its fixed 11-character
/// on-disk form: `mangle_segment(parent) + '.' + mangle_segment(leaf)`.
///
/// Splits on the *last* `.`, not the first: `"a.b.c"` mangles as
/// `mangle_segment("a.b") + "." + mangle_segment("c")`. A name with no `.`
/// mangles to a single 5-character segment.
pub fn mangle_full_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((parent, leaf)) => {
            format!("{}.{}", mangle_segment(parent), mangle_segment(leaf))
        }
        None => mangle_segment(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangle_segment_is_deterministic() {
        assert_eq!(mangle_segment("Items"), mangle_segment("Items"));
    }

    #[test]
    fn test_mangle_segment_length() {
        assert_eq!(mangle_segment("Items").len(), MANGLE_SEGMENT_LEN);
        assert_eq!(mangle_segment("").len(), MANGLE_SEGMENT_LEN);
    }

    #[test]
    fn test_mangle_full_name_shape() {
        let mangled = mangle_full_name("Items.WeaponSkin");
        assert_eq!(mangled.len(), 11);
        assert_eq!(mangled.as_bytes()[5], b'.');
        assert!(mangled.starts_with(&mangle_segment("Items")));
        assert!(mangled.ends_with(&mangle_segment("WeaponSkin")));
    }

    #[test]
    fn test_mangle_full_name_single_segment_matches_segment_prefix() {
        let single = mangle_full_name("Items");
        assert_eq!(single, mangle_segment("Items"));
        assert_eq!(single.len(), 5);
    }

    #[test]
    fn test_different_names_usually_differ() {
        assert_ne!(mangle_segment("Items"), mangle_segment("Itens"));
    }

    #[test]
    fn test_mangle_full_name_splits_on_last_dot() {
        let mangled = mangle_full_name("Items.Weapons.Sword");
        assert_eq!(mangled, format!("{}.{}", mangle_segment("Items.Weapons"), mangle_segment("Sword")));
    }
}
