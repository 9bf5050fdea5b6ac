//! The two hash functions that give every key its pair of home slots.
//!
//! Both functions depend on the current table size, so every resize moves
//! every key's homes. Nothing in this crate caches their results across a
//! size change.

/// `(sqrt(5) - 1) / 2`, the multiplier of the golden-ratio hash.
pub const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_894_9;

/// First home: multiplicative hash over a base-31 polynomial of the key.
///
/// The key's bytes are folded as `acc = acc * 31 + byte` (wrapping modulo
/// 2^64), scaled by [`GOLDEN_RATIO_CONJUGATE`], and the fractional part of
/// the product is spread over `0..table_size`.
///
/// # Examples
///
/// ```rust
/// use cuckoo_hash::hashing::golden_ratio_hash;
///
/// assert_eq!(golden_ratio_hash("a", 2), 1);
/// assert_eq!(golden_ratio_hash("c", 2), 0);
/// assert!(golden_ratio_hash("any key", 11) < 11);
/// ```
#[inline]
pub fn golden_ratio_hash(key: &str, table_size: u32) -> u32 {
    debug_assert!(table_size >= 2);

    let acc = key
        .bytes()
        .fold(0u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u64));

    // Both operands are non-negative, so truncation is floor.
    let scaled = acc as f64 * GOLDEN_RATIO_CONJUGATE;
    let fraction = scaled - (scaled as u64) as f64;
    let index = (table_size as f64 * fraction) as u32;

    // The product can round up to `table_size` for fractions within one ulp
    // of 1.0.
    index.min(table_size - 1)
}

/// Second home: byte-sum fold, never 0 and odd whenever the table size is
/// even.
///
/// The result lies in `1..table_size`. It is used as the alternate cuckoo
/// home and as the probe stride of double hashing.
///
/// # Examples
///
/// ```rust
/// use cuckoo_hash::hashing::fold_hash;
///
/// // 'a' is 97: 97 % 10 + 1
/// assert_eq!(fold_hash("a", 11), 8);
/// // 97 % 9 + 1 = 8 is even on an even table, so it is bumped to 9
/// assert_eq!(fold_hash("a", 10), 9);
/// ```
#[inline]
pub fn fold_hash(key: &str, table_size: u32) -> u32 {
    debug_assert!(table_size >= 2);

    let sum = key
        .bytes()
        .fold(0u32, |sum, byte| sum.wrapping_add(byte as u32));

    let index = sum % (table_size - 1) + 1;
    if table_size % 2 == 0 && index % 2 == 0 {
        index + 1
    } else {
        index
    }
}

/// Both homes of `key` for a table of `table_size` slots.
#[inline]
pub fn homes(key: &str, table_size: u32) -> (u32, u32) {
    (
        golden_ratio_hash(key, table_size),
        fold_hash(key, table_size),
    )
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn golden_ratio_hash_known_values() {
        // 97 * A = 59.949..., 98 * A = 60.567..., 99 * A = 61.185...
        assert_eq!(golden_ratio_hash("a", 2), 1);
        assert_eq!(golden_ratio_hash("b", 2), 1);
        assert_eq!(golden_ratio_hash("c", 2), 0);
        assert_eq!(golden_ratio_hash("a", 5), 4);
        assert_eq!(golden_ratio_hash("b", 5), 2);
        assert_eq!(golden_ratio_hash("a", 11), 10);
        assert_eq!(golden_ratio_hash("c", 11), 2);
    }

    #[test]
    fn golden_ratio_hash_stays_in_range() {
        for size in [2u32, 3, 5, 11, 23, 1_000, 65_537] {
            for i in 0..500 {
                let key = format!("key_{i:08X}");
                assert!(golden_ratio_hash(&key, size) < size, "{key} @ {size}");
            }
        }
    }

    #[test]
    fn golden_ratio_hash_wraps_long_keys() {
        let key = "x".repeat(4096);
        assert!(golden_ratio_hash(&key, 97) < 97);
    }

    #[test]
    fn fold_hash_is_never_zero_and_below_size() {
        for size in [2u32, 3, 4, 5, 10, 11, 64, 1_023] {
            for i in 0..500 {
                let key = format!("k{i}");
                let h = fold_hash(&key, size);
                assert!(h >= 1, "{key} @ {size}");
                assert!(h < size, "{key} @ {size}");
            }
        }
    }

    #[test]
    fn fold_hash_is_odd_on_even_tables() {
        for size in [2u32, 4, 10, 64, 1_000] {
            for i in 0..500 {
                let key = format!("k{i}");
                assert_eq!(fold_hash(&key, size) % 2, 1, "{key} @ {size}");
            }
        }
    }

    #[test]
    fn empty_key_has_defined_homes() {
        assert_eq!(homes("", 7), (0, 1));
    }

    #[test]
    fn homes_depend_on_table_size() {
        assert_ne!(homes("a", 5), homes("a", 11));
    }
}
