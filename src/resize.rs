use alloc::vec::Vec;
use core::mem;

use crate::slots::Entry;
use crate::slots::SlotArray;

/// When a table must grow before taking another entry.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResizePolicy {
    max_load_factor: f64,
}

pub(crate) const CUCKOO_POLICY: ResizePolicy = ResizePolicy {
    max_load_factor: 0.5,
};

pub(crate) const DOUBLE_HASH_POLICY: ResizePolicy = ResizePolicy {
    max_load_factor: 0.7,
};

impl ResizePolicy {
    /// Whether holding `len` entries in `table_size` slots exceeds the
    /// policy.
    #[inline]
    pub(crate) fn exceeded(self, len: u32, table_size: u32) -> bool {
        len as f64 / table_size as f64 > self.max_load_factor
    }

    #[cfg(test)]
    pub(crate) fn max_load_factor(self) -> f64 {
        self.max_load_factor
    }
}

/// `2n + 1`: always odd, so the parity fixup of the fold hash stays
/// meaningful across growth.
#[inline]
pub(crate) fn grown_size(table_size: u32) -> u32 {
    table_size
        .checked_mul(2)
        .and_then(|size| size.checked_add(1))
        .expect("table size overflow")
}

/// Grows `slots` and re-places every live entry plus `pending`.
///
/// `place` is the table kind's placement routine; it hands an entry back
/// when it cannot find room for it. Any such failure grows the table again
/// and restarts with the full entry set, so every entry survives and the
/// loop ends once the table is sparse enough.
#[cold]
pub(crate) fn grow_and_rehash<V>(
    slots: &mut SlotArray<V>,
    mut pending: Vec<Entry<V>>,
    mut place: impl FnMut(&mut SlotArray<V>, Entry<V>) -> Result<(), Entry<V>>,
) {
    loop {
        let old_size = slots.table_size();
        let new_size = grown_size(old_size);
        let retired = mem::replace(slots, SlotArray::new(new_size));
        pending.extend(retired.into_entries());

        log::debug!(
            "growing table from {} to {} slots, rehashing {} entries",
            old_size,
            new_size,
            pending.len()
        );

        let mut remaining = mem::take(&mut pending).into_iter();
        let homeless = remaining
            .by_ref()
            .find_map(|entry| place(&mut *slots, entry).err());

        match homeless {
            None => return,
            Some(entry) => {
                log::trace!(
                    "rehash into {} slots could not place `{}`, growing again",
                    new_size,
                    entry.key
                );
                pending.push(entry);
                pending.extend(remaining);
            }
        }
    }
}
