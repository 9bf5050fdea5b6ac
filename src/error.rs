//! Error types for table construction, insertion and persistence.

use alloc::string::String;

use thiserror::Error;

/// Errors raised by the in-memory tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The requested table size cannot carry both hash functions.
    ///
    /// Double hashing needs at least two slots; so does any table restored
    /// from a persisted form.
    #[error("invalid table size {requested}: a table needs at least 2 slots")]
    InvalidSize {
        /// The size that was asked for.
        requested: u32,
    },
    /// The requested table size cannot be allocated.
    #[error("cannot allocate a table of {requested} slots")]
    TooLarge {
        /// The size that was asked for.
        requested: u32,
    },
    /// Every slot of the table is taken, so the key has nowhere to go.
    #[error("hash table is full: no free slot for `{key}`")]
    Full {
        /// The key that could not be placed.
        key: String,
    },
}

/// Errors raised while writing or reading a persisted table.
///
/// A failed read never touches an existing table: readers build a fresh
/// table and only hand it back once every entry has been validated.
#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The input ended inside the header.
    #[error("input ended inside the header")]
    TruncatedHeader,
    /// The input ended inside a slot record.
    #[error("input ended while reading the {what} of slot {slot}")]
    TruncatedSlot {
        /// The field being read.
        what: &'static str,
        /// The slot being read.
        slot: u32,
    },
    /// The text header is not `<table size> <element count>`.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// A text entry is not `<index> <key> <value>`.
    #[error("malformed entry on line {line}: {reason}")]
    MalformedEntry {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// An entry names a slot past the end of the table.
    #[error("slot index {index} is out of bounds for table size {table_size}")]
    IndexOutOfBounds {
        /// The offending slot index.
        index: u32,
        /// The declared table size.
        table_size: u32,
    },
    /// Two entries name the same slot.
    #[error("slot {index} is listed more than once")]
    DuplicateSlot {
        /// The repeated slot index.
        index: u32,
    },
    /// Two entries carry the same key.
    #[error("key `{key}` is listed more than once")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
    /// An entry sits at a slot that is not one of its key's homes.
    #[error("key `{key}` cannot live at slot {index} of a {table_size}-slot table")]
    MisplacedEntry {
        /// The misplaced key.
        key: String,
        /// The slot it was found at.
        index: u32,
        /// The declared table size.
        table_size: u32,
    },
    /// The header's element count disagrees with the entries that follow.
    #[error("header declares {declared} elements but {found} were read")]
    CountMismatch {
        /// Count from the header.
        declared: u32,
        /// Entries actually read.
        found: u32,
    },
    /// A binary occupied flag is neither 0 nor 1.
    #[error("invalid occupied flag {flag:#04x} at slot {slot}")]
    InvalidFlag {
        /// The raw flag byte.
        flag: u8,
        /// The slot being read.
        slot: u32,
    },
    /// A binary key is not valid UTF-8.
    #[error("key at slot {slot} is not valid UTF-8")]
    InvalidKey {
        /// The slot being read.
        slot: u32,
    },
    /// A binary value is not a valid encoding of the value type.
    #[error("value at slot {slot} is not a valid encoding")]
    InvalidValue {
        /// The slot being read.
        slot: u32,
    },
    /// The key cannot be represented in the target format.
    #[error("key `{key}` cannot be written: {reason}")]
    UnencodableKey {
        /// The key.
        key: String,
        /// Why it cannot be written.
        reason: &'static str,
    },
    /// The value's text form cannot be represented on a single line.
    #[error("value of key `{key}` cannot be written: its text spans several lines")]
    UnencodableValue {
        /// The key owning the value.
        key: String,
    },
    /// The header describes a table that cannot exist.
    #[error(transparent)]
    Table(#[from] TableError),
}
