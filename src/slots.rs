use alloc::string::String;
use alloc::vec::Vec;
use core::iter::Enumerate;
use core::slice;

use crate::error::TableError;

/// A live key/value pair resident in a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Entry<V> {
    pub(crate) key: String,
    pub(crate) value: V,
}

impl<V> Entry<V> {
    #[inline]
    pub(crate) fn new(key: String, value: V) -> Self {
        Self { key, value }
    }
}

/// Fixed-length slot storage shared by both table kinds.
///
/// Holds `table_size + 1` slots. The trailing slot is reserved: no hash
/// function targets it and it is never reported as occupied. The occupied
/// count is maintained here so it can never drift from the slots
/// themselves.
#[derive(Clone)]
pub(crate) struct SlotArray<V> {
    slots: Vec<Option<Entry<V>>>,
    table_size: u32,
    occupied: u32,
}

impl<V> SlotArray<V> {
    pub(crate) fn new(table_size: u32) -> Self {
        debug_assert!(table_size >= 2);

        let mut slots = Vec::new();
        slots.resize_with(table_size as usize + 1, || None);
        Self {
            slots,
            table_size,
            occupied: 0,
        }
    }

    /// Like [`SlotArray::new`], but reports sizes below 2 and sizes that
    /// cannot be allocated instead of panicking or aborting.
    pub(crate) fn try_new(table_size: u32) -> Result<Self, TableError> {
        if table_size < 2 {
            return Err(TableError::InvalidSize {
                requested: table_size,
            });
        }

        let too_large = || TableError::TooLarge {
            requested: table_size,
        };
        let capacity = (table_size as usize).checked_add(1).ok_or_else(too_large)?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|_| too_large())?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            table_size,
            occupied: 0,
        })
    }

    #[inline]
    pub(crate) fn table_size(&self) -> u32 {
        self.table_size
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.occupied
    }

    #[inline]
    pub(crate) fn get(&self, index: u32) -> Option<&Entry<V>> {
        self.slots[index as usize].as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, index: u32) -> Option<&mut Entry<V>> {
        self.slots[index as usize].as_mut()
    }

    #[inline]
    pub(crate) fn is_vacant(&self, index: u32) -> bool {
        self.slots[index as usize].is_none()
    }

    /// Whether slot `index` is occupied by `key`.
    #[inline]
    pub(crate) fn holds(&self, index: u32, key: &str) -> bool {
        self.get(index).is_some_and(|entry| entry.key == key)
    }

    /// Places `entry` in slot `index`, handing back the previous occupant.
    #[inline]
    pub(crate) fn swap(&mut self, index: u32, entry: Entry<V>) -> Option<Entry<V>> {
        debug_assert!(index < self.table_size);

        let previous = self.slots[index as usize].replace(entry);
        if previous.is_none() {
            self.occupied += 1;
        }
        previous
    }

    /// Places `entry` in the vacant slot `index`.
    #[inline]
    pub(crate) fn put(&mut self, index: u32, entry: Entry<V>) {
        let previous = self.swap(index, entry);
        debug_assert!(previous.is_none());
    }

    #[inline]
    pub(crate) fn take(&mut self, index: u32) -> Option<Entry<V>> {
        let entry = self.slots[index as usize].take();
        if entry.is_some() {
            self.occupied -= 1;
        }
        entry
    }

    /// Empties every slot, keeping the table size.
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.occupied = 0;
    }

    /// Consumes the array, yielding every live entry in slot order.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = Entry<V>> {
        self.slots.into_iter().flatten()
    }

    pub(crate) fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.slots[..self.table_size as usize].iter().enumerate(),
            remaining: self.occupied,
        }
    }

    /// Occupied slots as `(index, entry)` pairs in slot order.
    pub(crate) fn occupied(&self) -> impl Iterator<Item = (u32, &Entry<V>)> {
        self.slots[..self.table_size as usize]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (index as u32, entry)))
    }
}

/// An iterator over the occupied slots of a table, in slot order.
///
/// Yields `(&str, &V)` pairs. This struct is created by the `iter` method
/// of [`CuckooTable`](crate::CuckooTable) and
/// [`DoubleHashTable`](crate::DoubleHashTable).
pub struct Iter<'a, V> {
    inner: Enumerate<slice::Iter<'a, Option<Entry<V>>>>,
    remaining: u32,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (_, slot) in self.inner.by_ref() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((entry.key.as_str(), &entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Access the codecs need to rebuild either table kind slot by slot.
pub(crate) trait SlotTable<V>: Sized {
    /// An empty table of exactly `table_size` slots.
    fn with_table_size(table_size: u32) -> Result<Self, TableError>;

    fn slots(&self) -> &SlotArray<V>;

    fn slots_mut(&mut self) -> &mut SlotArray<V>;

    /// Whether `index` is a slot at which `key` can legally live.
    fn is_home(key: &str, index: u32, table_size: u32) -> bool;

    fn contains_key(&self, key: &str) -> bool;
}
