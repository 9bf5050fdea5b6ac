//! A string-keyed table using two-home cuckoo hashing.
//!
//! Every key lives at one of exactly two slots: its
//! [golden-ratio home](crate::hashing::golden_ratio_hash) or its
//! [fold home](crate::hashing::fold_hash). Lookups and removals therefore
//! inspect at most two slots. Insertion makes room by evicting occupants to
//! their other home; a displacement chain that runs too long is treated as
//! a cycle and resolved by growing the table.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::mem;

use crate::error::TableError;
use crate::hashing;
use crate::resize;
use crate::resize::CUCKOO_POLICY;
use crate::slots::Entry;
use crate::slots::Iter;
use crate::slots::SlotArray;
use crate::slots::SlotTable;

/// Table size used when the requested size cannot carry both hash
/// functions.
const DEFAULT_TABLE_SIZE: u32 = 3;

/// Placement statistics for a [`CuckooTable`].
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq)]
pub struct CuckooStats {
    /// Number of slots addressed by the hash functions.
    pub table_size: u32,
    /// Number of live entries.
    pub len: u32,
    /// `len / table_size`.
    pub load_factor: f64,
    /// Entries sitting at their golden-ratio home.
    pub primary_homes: u32,
    /// Entries sitting at their fold home (and not also at the primary).
    pub secondary_homes: u32,
}

#[cfg(any(test, feature = "stats"))]
impl CuckooStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Cuckoo Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.table_size,
            self.load_factor * 100.0
        );
        println!(
            "Homes: {} primary, {} secondary",
            self.primary_homes, self.secondary_homes
        );
    }
}

/// A string-keyed hash table using two-home cuckoo hashing.
///
/// `CuckooTable<V>` maps `String` keys to values of type `V`. Insertion
/// never fails: displacement cycles are resolved by growing the table and
/// re-placing every entry. The table keeps its load factor at or below 0.5
/// and never shrinks.
///
/// The table is meant for single-threaded use; it holds no locks.
///
/// ## Example
///
/// ```rust
/// use cuckoo_hash::CuckooTable;
///
/// let mut table = CuckooTable::new(2);
/// for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
///     table.insert(key, i as u32 + 1);
/// }
///
/// assert_eq!(table.len(), 5);
/// assert_eq!(table.find("c"), Some(&3));
/// assert!(table.load_factor() <= 0.5);
/// ```
#[derive(Clone)]
pub struct CuckooTable<V> {
    slots: SlotArray<V>,
}

impl<V> Debug for CuckooTable<V>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CuckooTable")
            .field("table_size", &self.slots.table_size())
            .field("len", &self.slots.len())
            .field("entries", &DebugEntries(&self.slots))
            .finish()
    }
}

struct DebugEntries<'a, V>(&'a SlotArray<V>);

impl<V: Debug> Debug for DebugEntries<'_, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.0
                    .occupied()
                    .map(|(index, entry)| (index, (&entry.key, &entry.value))),
            )
            .finish()
    }
}

impl<V> Default for CuckooTable<V> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<V> CuckooTable<V> {
    /// Creates an empty table addressing `table_size` slots.
    ///
    /// Sizes below 2 cannot carry the fold hash and are replaced with 3.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let table: CuckooTable<u32> = CuckooTable::new(16);
    /// assert_eq!(table.table_size(), 16);
    ///
    /// let table: CuckooTable<u32> = CuckooTable::new(0);
    /// assert_eq!(table.table_size(), 3);
    /// ```
    pub fn new(table_size: u32) -> Self {
        let table_size = if table_size < 2 {
            DEFAULT_TABLE_SIZE
        } else {
            table_size
        };
        Self {
            slots: SlotArray::new(table_size),
        }
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
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let mut table = CuckooTable::new(2);
    /// table.insert("a", 1);
    /// table.insert("b", 2);
    /// let size = table.table_size();
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.table_size(), size);
    /// ```
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns an iterator over the entries, in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        self.slots.iter()
    }

    /// Returns the slot holding `key`, if any.
    #[inline]
    fn position(&self, key: &str) -> Option<u32> {
        let size = self.slots.table_size();
        let first = hashing::golden_ratio_hash(key, size);
        if self.slots.holds(first, key) {
            return Some(first);
        }

        let second = hashing::fold_hash(key, size);
        if self.slots.holds(second, key) {
            return Some(second);
        }

        None
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// The reference borrows the table, so it cannot outlive the next
    /// insert, removal or resize.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let mut table = CuckooTable::new(8);
    /// table.insert("answer", 42);
    ///
    /// assert_eq!(table.find("answer"), Some(&42));
    /// assert_eq!(table.find("question"), None);
    /// ```
    pub fn find(&self, key: &str) -> Option<&V> {
        let index = self.position(key)?;
        self.slots.get(index).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// Writes through the reference land in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let mut table = CuckooTable::new(8);
    /// table.insert("counter", 1);
    ///
    /// if let Some(value) = table.find_mut("counter") {
    ///     *value += 1;
    /// }
    /// assert_eq!(table.find("counter"), Some(&2));
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
    /// an existing key never moves anything. A new key may grow the table,
    /// either because the load factor would pass 0.5 or because its
    /// displacement chain turned into a cycle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let mut table = CuckooTable::new(8);
    /// assert_eq!(table.insert("k", 1), None);
    /// assert_eq!(table.insert("k", 2), Some(1));
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.find("k"), Some(&2));
    /// ```
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(current) = self.find_mut(&key) {
            return Some(mem::replace(current, value));
        }

        if CUCKOO_POLICY.exceeded(self.slots.len() + 1, self.slots.table_size()) {
            self.grow(vec![]);
        }

        if let Err(homeless) = displace(&mut self.slots, Entry::new(key, value)) {
            self.grow(vec![homeless]);
        }

        None
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cuckoo_hash::CuckooTable;
    ///
    /// let mut table = CuckooTable::new(8);
    /// table.insert("a", 1);
    ///
    /// assert!(table.remove("a"));
    /// assert!(!table.remove("a"));
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(&mut self, key: &str) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn take(&mut self, key: &str) -> Option<V> {
        let index = self.position(key)?;
        self.slots.take(index).map(|entry| entry.value)
    }

    fn grow(&mut self, pending: Vec<Entry<V>>) {
        resize::grow_and_rehash(&mut self.slots, pending, displace);
    }

    /// Computes placement statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> CuckooStats {
        let size = self.slots.table_size();
        let mut primary_homes = 0;
        let mut secondary_homes = 0;
        for (index, entry) in self.slots.occupied() {
            if index == hashing::golden_ratio_hash(&entry.key, size) {
                primary_homes += 1;
            } else if index == hashing::fold_hash(&entry.key, size) {
                secondary_homes += 1;
            }
        }

        CuckooStats {
            table_size: size,
            len: self.slots.len(),
            load_factor: self.load_factor(),
            primary_homes,
            secondary_homes,
        }
    }
}

/// Runs the eviction chain for `entry`.
///
/// Each step places the carried entry and picks up the occupant it
/// displaced, sending that occupant to its other home. After
/// `2 * table_size` steps the chain is declared a cycle and the entry still
/// being carried is handed back. Every entry left in the slots sits at one
/// of its homes either way.
fn displace<V>(slots: &mut SlotArray<V>, entry: Entry<V>) -> Result<(), Entry<V>> {
    let size = slots.table_size();
    let mut carried = entry;
    let mut position = hashing::golden_ratio_hash(&carried.key, size);

    for _ in 0..(size as u64 * 2) {
        match slots.swap(position, carried) {
            None => return Ok(()),
            Some(evicted) => {
                let (first, second) = hashing::homes(&evicted.key, size);
                position = if position == first { second } else { first };
                carried = evicted;
            }
        }
    }

    log::trace!(
        "displacement cycle in {}-slot table, `{}` left homeless",
        size,
        carried.key
    );
    Err(carried)
}

impl<'a, V> IntoIterator for &'a CuckooTable<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Extend<(K, V)> for CuckooTable<V>
where
    K: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for CuckooTable<V>
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<V> SlotTable<V> for CuckooTable<V> {
    fn with_table_size(table_size: u32) -> Result<Self, TableError> {
        Ok(Self {
            slots: SlotArray::try_new(table_size)?,
        })
    }

    fn slots(&self) -> &SlotArray<V> {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut SlotArray<V> {
        &mut self.slots
    }

    fn is_home(key: &str, index: u32, table_size: u32) -> bool {
        let (first, second) = hashing::homes(key, table_size);
        index == first || index == second
    }

    fn contains_key(&self, key: &str) -> bool {
        CuckooTable::contains_key(self, key)
    }
}
