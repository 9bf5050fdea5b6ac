//! A string-keyed table using double hashing.
//!
//! Collisions are resolved without eviction: a key probes the slots
//! `(h1 + i * h2) mod table_size` for `i = 0, 1, 2, ...`, where `h1` is the
//! [golden-ratio hash](crate::hashing::golden_ratio_hash) and `h2` the
//! [fold hash](crate::hashing::fold_hash). Removal simply vacates the slot.
//! There are no tombstones because lookups walk the whole probe sequence
//! instead of stopping at the first vacant slot.

use alloc::string::String;
use alloc::vec;
use core::fmt::Debug;
use core::mem;

use crate::error::TableError;
use crate::hashing;
use crate::resize;
use crate::resize::DOUBLE_HASH_POLICY;
use crate::slots::Entry;
use crate::slots::Iter;
use crate::slots::SlotArray;
use crate::slots::SlotTable;

/// The slots visited by one key, in probe order.
///
/// The sequence ends after `table_size` steps or as soon as it would
/// revisit its starting slot, whichever comes first. When the stride shares
/// a factor with the table size that happens early and only part of the
/// table is reachable.
#[derive(Clone, Debug)]
struct ProbeSequence {
    start: u32,
    stride: u32,
    table_size: u32,
    step: u32,
}

impl ProbeSequence {
    #[inline]
    fn new(key: &str, table_size: u32) -> Self {
        let (start, stride) = hashing::homes(key, table_size);
        Self {
            start,
            stride,
            table_size,
            step: 0,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.step >= self.table_size {
            return None;
        }

        let index = ((self.start as u64 + self.step as u64 * self.stride as u64)
            % self.table_size as u64) as u32;
        if self.step > 0 && index == self.start {
            self.step = self.table_size;
            return None;
        }

        self.step += 1;
        Some(index)
    }
}

/// Probe statistics for a [`DoubleHashTable`].
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleHashStats {
    /// Number of slots addressed by the hash functions.
    pub table_size: u32,
    /// Number of live entries.
    pub len: u32,
    /// `len / table_size`.
    pub load_factor: f64,
    /// Largest number of probe steps between an entry's first probe and its
    /// slot.
    pub longest_probe: u32,
    /// Mean number of probe steps over all entries.
    pub mean_probe: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DoubleHashStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Double Hash Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.table_size,
            self.load_factor * 100.0
        );
        println!(
            "Probes: longest {}, mean {:.3}",
            self.longest_probe, self.mean_probe
        );
    }
}

/// A string-keyed hash table using double hashing.
///
/// `DoubleHashTable<V>` maps `String` keys to values of type `V`. The table
/// grows to `2n + 1` slots before an insertion would push its load factor
/// past 0.7, and also whenever a new key's probe sequence is fully taken.
/// It never shrinks.
///
/// Unlike [`CuckooTable`](crate::CuckooTable), construction and insertion
/// are fallible: a table needs at least two slots, and an insertion into a
/// table without any vacant slot reports [`TableError::Full`].
///
/// ## Example
///
/// ```rust
/// use cuckoo_hash::DoubleHashTable;
/// use cuckoo_hash::TableError;
///
/// let mut table = DoubleHashTable::new(5)?;
/// table.insert("key1", "value1")?;
/// table.insert("key1", "value2")?;
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.find("key1"), Some(&"value2"));
///
/// assert!(DoubleHashTable::<u32>::new(0).is_err());
/// # Ok::<(), TableError>(())
/// ```
#[derive(Clone)]
pub struct DoubleHashTable<V> {
    slots: SlotArray<V>,
}

impl<V> Debug for DoubleHashTable<V>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (index, entry) in self.slots.occupied() {
            map.entry(&index, &(&entry.key, &entry.value));
        }
        map.finish()
    }
}

impl<V> DoubleHashTable<V> {
    /// Creates an empty table addressing `table_size` slots.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidSize`] for sizes below 2 and
    /// [`TableError::TooLarge`] when the slots cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::DoubleHashTable;
    /// use cuckoo_hash::TableError;
    ///
    /// let table = DoubleHashTable::<u64>::new(10).unwrap();
    /// assert!(table.is_empty());
    ///
    /// assert_eq!(
    ///     DoubleHashTable::<u64>::new(0).unwrap_err(),
    ///     TableError::InvalidSize { requested: 0 }
    /// );
    /// ```
    pub fn new(table_size: u32) -> Result<Self, TableError> {
        Ok(Self {
            slots: SlotArray::try_new(table_size)?,
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> u32 {
        self.slots.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    /// Returns the number of slots addressed by the hash functions.
    pub fn table_size(&self) -> u32 {
        self.slots.table_size()
    }

    /// Returns `len / table_size`.
    pub fn load_factor(&self) -> f64 {
        self.slots.len() as f64 / self.slots.table_size() as f64
    }

    /// Removes every entry, keeping the table size.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns an iterator over the entries, in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        self.slots.iter()
    }

    #[inline]
    fn position(&self, key: &str) -> Option<u32> {
        if self.slots.len() == 0 {
            return None;
        }

        ProbeSequence::new(key, self.slots.table_size())
            .find(|&index| self.slots.holds(index, key))
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// The reference borrows the table, so it cannot outlive the next
    /// insert, removal or resize.
    pub fn find(&self, key: &str) -> Option<&V> {
        let index = self.position(key)?;
        self.slots.get(index).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::DoubleHashTable;
    ///
    /// let mut table = DoubleHashTable::new(5).unwrap();
    /// table.insert("name", String::from("hello")).unwrap();
    ///
    /// table.find_mut("name").unwrap().push_str(" world");
    /// assert_eq!(table.find("name").map(String::as_str), Some("hello world"));
    /// ```
    pub fn find_mut(&mut self, key: &str) -> Option<&mut V> {
        let index = self.position(key)?;
        self.slots.get_mut(index).map(|entry| &mut entry.value)
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts or updates the value stored under `key`.
    ///
    /// Returns the previous value when `key` was already present. Updating
    /// an existing key never resizes, even when the table sits at its load
    /// limit, so `table_size()` only changes on insertion of a new key.
    ///
    /// A new key grows the table first if it would push the load factor
    /// past 0.7, then takes the first free slot on its probe sequence. When
    /// the stride shares a factor with the table size the sequence only
    /// visits part of the table; if that part is fully taken the table
    /// grows until the key fits.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Full`] only when no slot of the table is
    /// vacant, which the load limit keeps from happening.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::DoubleHashTable;
    ///
    /// let mut table = DoubleHashTable::new(10).unwrap();
    /// for i in 0..1_000 {
    ///     table.insert(format!("key_{i}"), i).unwrap();
    /// }
    /// assert_eq!(table.len(), 1_000);
    /// assert_eq!(table.find("key_186"), Some(&186));
    /// ```
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>, TableError> {
        let key = key.into();
        if let Some(current) = self.find_mut(&key) {
            return Ok(Some(mem::replace(current, value)));
        }

        if DOUBLE_HASH_POLICY.exceeded(self.slots.len() + 1, self.slots.table_size()) {
            resize::grow_and_rehash(&mut self.slots, vec![], probe_place);
        }

        if let Err(homeless) = probe_place(&mut self.slots, Entry::new(key, value)) {
            self.grow_for(homeless)?;
        }
        Ok(None)
    }

    /// Makes room for an entry whose probe sequence is fully taken.
    ///
    /// Growing changes both the start and the stride of every sequence, so
    /// the table grows until the entry is placed. Only a table with no
    /// vacant slot at all reports [`TableError::Full`].
    #[cold]
    fn grow_for(&mut self, homeless: Entry<V>) -> Result<(), TableError> {
        let size = self.slots.table_size();
        if self.slots.len() >= size {
            log::trace!("no vacant slot for `{}` in {}-slot table", homeless.key, size);
            return Err(TableError::Full { key: homeless.key });
        }

        log::trace!(
            "probe sequence of `{}` exhausted with {} of {} slots vacant, growing",
            homeless.key,
            size - self.slots.len(),
            size
        );
        resize::grow_and_rehash(&mut self.slots, vec![homeless], probe_place);
        Ok(())
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key` and returns its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::DoubleHashTable;
    ///
    /// let mut table = DoubleHashTable::new(5).unwrap();
    /// table.insert("a", 1).unwrap();
    ///
    /// assert_eq!(table.take("a"), Some(1));
    /// assert_eq!(table.take("a"), None);
    /// ```
    pub fn take(&mut self, key: &str) -> Option<V> {
        let index = self.position(key)?;
        self.slots.take(index).map(|entry| entry.value)
    }

    /// Computes probe statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> DoubleHashStats {
        let size = self.slots.table_size();
        let mut longest_probe = 0;
        let mut total_probe = 0u64;
        for (index, entry) in self.slots.occupied() {
            let distance = ProbeSequence::new(&entry.key, size)
                .position(|probe| probe == index)
                .unwrap_or(0) as u32;
            longest_probe = longest_probe.max(distance);
            total_probe += distance as u64;
        }

        DoubleHashStats {
            table_size: size,
            len: self.slots.len(),
            load_factor: self.load_factor(),
            longest_probe,
            mean_probe: if self.slots.len() == 0 {
                0.0
            } else {
                total_probe as f64 / self.slots.len() as f64
            },
        }
    }
}

/// Puts `entry` in the first vacant slot of its probe sequence, handing it
/// back when there is none.
///
/// The caller guarantees the key is not already present.
fn probe_place<V>(slots: &mut SlotArray<V>, entry: Entry<V>) -> Result<(), Entry<V>> {
    let free =
        ProbeSequence::new(&entry.key, slots.table_size()).find(|&index| slots.is_vacant(index));
    match free {
        Some(index) => {
            slots.put(index, entry);
            Ok(())
        }
        None => Err(entry),
    }
}

impl<'a, V> IntoIterator for &'a DoubleHashTable<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> SlotTable<V> for DoubleHashTable<V> {
    fn with_table_size(table_size: u32) -> Result<Self, TableError> {
        Self::new(table_size)
    }

    fn slots(&self) -> &SlotArray<V> {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotArray<V> {
        &mut self.slots
    }

    fn is_home(key: &str, index: u32, table_size: u32) -> bool {
        ProbeSequence::new(key, table_size).any(|probe| probe == index)
    }

    fn contains_key(&self, key: &str) -> bool {
        DoubleHashTable::contains_key(self, key)
    }
}
