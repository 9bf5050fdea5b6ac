use core::marker::PhantomData;

use crate::error::CodecError;
use crate::error::TableError;
use crate::slots::Entry;
use crate::slots::SlotTable;

/// Builds a table slot by slot from a persisted form, checking every entry
/// before it lands.
pub(crate) struct Restore<T, V> {
    table: T,
    declared: u32,
    _values: PhantomData<V>,
}

impl<T: SlotTable<V>, V> Restore<T, V> {
    /// Rejects headers that cannot describe a table, before anything is
    /// allocated.
    pub(crate) fn check_header(table_size: u32, declared: u32) -> Result<(), CodecError> {
        if table_size < 2 {
            return Err(TableError::InvalidSize {
                requested: table_size,
            }
            .into());
        }
        if declared > table_size {
            return Err(CodecError::MalformedHeader(format!(
                "element count {declared} exceeds table size {table_size}"
            )));
        }
        Ok(())
    }

    /// Starts an empty table of exactly `table_size` slots.
    ///
    /// The slots are allocated fallibly, so a header naming a table too
    /// large for memory comes back as [`TableError::TooLarge`].
    pub(crate) fn new(table_size: u32, declared: u32) -> Result<Self, CodecError> {
        Self::check_header(table_size, declared)?;
        Ok(Self {
            table: T::with_table_size(table_size)?,
            declared,
            _values: PhantomData,
        })
    }

    pub(crate) fn table_size(&self) -> u32 {
        self.table.slots().table_size()
    }

    /// Places `key` at `index`.
    ///
    /// Rejects indices past the table, slots listed twice, keys listed twice
    /// and keys that could never be found at `index`.
    pub(crate) fn place(&mut self, index: u32, key: String, value: V) -> Result<(), CodecError> {
        let table_size = self.table_size();
        if index >= table_size {
            return Err(CodecError::IndexOutOfBounds { index, table_size });
        }
        if !self.table.slots().is_vacant(index) {
            return Err(CodecError::DuplicateSlot { index });
        }
        if !T::is_home(&key, index, table_size) {
            return Err(CodecError::MisplacedEntry {
                key,
                index,
                table_size,
            });
        }
        if self.table.contains_key(&key) {
            return Err(CodecError::DuplicateKey { key });
        }

        self.table.slots_mut().put(index, Entry::new(key, value));
        Ok(())
    }

    /// Hands back the table once the header's element count checks out.
    pub(crate) fn finish(self) -> Result<T, CodecError> {
        let found = self.table.slots().len();
        if found != self.declared {
            return Err(CodecError::CountMismatch {
                declared: self.declared,
                found,
            });
        }

        log::debug!(
            "restored {} entries into a {}-slot table",
            found,
            self.table.slots().table_size()
        );
        Ok(self.table)
    }
}
