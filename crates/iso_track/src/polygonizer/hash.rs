//! Packing of three grid coordinates into one wide hash key.
//!
//! The key's bit width is split into three equal fields and each coordinate
//! is shifted and masked into its field. Coordinates are assumed to fit the
//! per-field bit count; values beyond it alias. That precondition is
//! documented, not runtime-checked.

/// 64-bit cell hash: 21 bits per coordinate.
pub struct CellHash64;

impl CellHash64 {
    pub const BITS: u32 = u64::BITS / 3;
    pub const MASK: u64 = (1u64 << Self::BITS) - 1;

    #[inline]
    pub const fn pack(x: u64, y: u64, z: u64) -> u64 {
        (((x & Self::MASK) << Self::BITS | (y & Self::MASK)) << Self::BITS) | (z & Self::MASK)
    }

    #[inline]
    pub const fn unpack(key: u64) -> (u64, u64, u64) {
        (
            (key >> (2 * Self::BITS)) & Self::MASK,
            (key >> Self::BITS) & Self::MASK,
            key & Self::MASK,
        )
    }
}

/// 128-bit cell hash for extended coordinate range: 42 bits per coordinate.
pub struct CellHash128;

impl CellHash128 {
    pub const BITS: u32 = u128::BITS / 3;
    pub const MASK: u128 = (1u128 << Self::BITS) - 1;

    #[inline]
    pub const fn pack(x: u128, y: u128, z: u128) -> u128 {
        (((x & Self::MASK) << Self::BITS | (y & Self::MASK)) << Self::BITS) | (z & Self::MASK)
    }

    #[inline]
    pub const fn unpack(key: u128) -> (u128, u128, u128) {
        (
            (key >> (2 * Self::BITS)) & Self::MASK,
            (key >> Self::BITS) & Self::MASK,
            key & Self::MASK,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip_64() {
        let coords = [
            (0u64, 0, 0),
            (1, 2, 3),
            (CellHash64::MASK, 0, CellHash64::MASK),
            (123_456, 654_321, 999_999),
        ];
        for (x, y, z) in coords {
            assert_eq!(CellHash64::unpack(CellHash64::pack(x, y, z)), (x, y, z));
        }
    }

    #[test]
    fn pack_is_injective_over_a_sub_range() {
        let mut seen = std::collections::HashSet::new();
        for x in 0..8u64 {
            for y in 0..8u64 {
                for z in 0..8u64 {
                    assert!(seen.insert(CellHash64::pack(x, y, z)));
                }
            }
        }
        assert_eq!(seen.len(), 512);
    }

    #[test]
    fn pack_unpack_roundtrip_128() {
        let big = CellHash128::MASK;
        assert_eq!(
            CellHash128::unpack(CellHash128::pack(big, 1, big - 1)),
            (big, 1, big - 1)
        );
    }

    #[test]
    fn field_widths_cover_the_word() {
        assert_eq!(CellHash64::BITS, 21);
        assert_eq!(CellHash128::BITS, 42);
    }
}
