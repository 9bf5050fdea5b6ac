//! Compact binary persistence.
//!
//! All integers are little-endian.
//!
//! | field           | encoding                                   |
//! |-----------------|--------------------------------------------|
//! | table size      | `u32`                                      |
//! | element count   | `u32`                                      |
//! | per slot        | `u8` occupied flag, `0` or `1`             |
//! | occupied slots  | `u32` key length, key bytes (UTF-8), value |
//!
//! There is one flag for each of the `table size` slots, in slot order.
//! Values use their [`FixedWidthValue`] encoding.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::codec::Restore;
use crate::error::CodecError;
use crate::slots::SlotTable;
use crate::CuckooTable;
use crate::DoubleHashTable;

const VACANT: u8 = 0;
const OCCUPIED: u8 = 1;

/// A value with a fixed-size binary encoding.
///
/// Implemented for the primitive integers, the floats and `bool`.
///
/// # Examples
///
/// ```rust
/// use cuckoo_hash::FixedWidthValue;
///
/// let mut buf = [0u8; 4];
/// 7u32.encode(&mut buf);
/// assert_eq!(buf, [7, 0, 0, 0]);
/// assert_eq!(u32::decode(&buf), Some(7));
/// assert_eq!(bool::decode(&[2]), None);
/// ```
pub trait FixedWidthValue: Sized {
    /// Number of bytes in the encoding.
    const WIDTH: usize;

    /// Encodes `self` into `buf`, which is exactly [`Self::WIDTH`] bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Decodes a value from `buf`, which is exactly [`Self::WIDTH`] bytes.
    ///
    /// Returns `None` for byte patterns that are not a valid encoding.
    fn decode(buf: &[u8]) -> Option<Self>;
}

macro_rules! fixed_width_le {
    ($($ty:ty => $width:literal, $read:ident, $write:ident;)*) => {
        $(
            impl FixedWidthValue for $ty {
                const WIDTH: usize = $width;

                #[inline]
                fn encode(&self, buf: &mut [u8]) {
                    LittleEndian::$write(buf, *self);
                }

                #[inline]
                fn decode(buf: &[u8]) -> Option<Self> {
                    Some(LittleEndian::$read(buf))
                }
            }
        )*
    };
}

fixed_width_le! {
    u16 => 2, read_u16, write_u16;
    u32 => 4, read_u32, write_u32;
    u64 => 8, read_u64, write_u64;
    u128 => 16, read_u128, write_u128;
    i16 => 2, read_i16, write_i16;
    i32 => 4, read_i32, write_i32;
    i64 => 8, read_i64, write_i64;
    i128 => 16, read_i128, write_i128;
    f32 => 4, read_f32, write_f32;
    f64 => 8, read_f64, write_f64;
}

impl FixedWidthValue for u8 {
    const WIDTH: usize = 1;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = *self;
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        buf.first().copied()
    }
}

impl FixedWidthValue for i8 {
    const WIDTH: usize = 1;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = *self as u8;
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        buf.first().map(|&byte| byte as i8)
    }
}

impl FixedWidthValue for bool {
    const WIDTH: usize = 1;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        match buf.first()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

/// Maps a premature end of input to `truncated`, keeping other I/O errors.
fn eof_as(truncated: CodecError) -> impl FnOnce(io::Error) -> CodecError {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            truncated
        } else {
            CodecError::Io(err)
        }
    }
}

fn write_table<T, V, W>(table: &T, mut writer: W) -> Result<(), CodecError>
where
    T: SlotTable<V>,
    V: FixedWidthValue,
    W: Write,
{
    let slots = table.slots();
    writer.write_u32::<LittleEndian>(slots.table_size())?;
    writer.write_u32::<LittleEndian>(slots.len())?;

    let mut value_buf = vec![0u8; V::WIDTH];
    for index in 0..slots.table_size() {
        let Some(entry) = slots.get(index) else {
            writer.write_u8(VACANT)?;
            continue;
        };

        let key_len = u32::try_from(entry.key.len()).map_err(|_| CodecError::UnencodableKey {
            key: entry.key.clone(),
            reason: "key length does not fit in 32 bits",
        })?;

        writer.write_u8(OCCUPIED)?;
        writer.write_u32::<LittleEndian>(key_len)?;
        writer.write_all(entry.key.as_bytes())?;
        entry.value.encode(&mut value_buf);
        writer.write_all(&value_buf)?;
    }

    writer.flush()?;
    Ok(())
}

fn read_table<T, V, R>(mut reader: R) -> Result<T, CodecError>
where
    T: SlotTable<V>,
    V: FixedWidthValue,
    R: Read,
{
    let table_size = reader
        .read_u32::<LittleEndian>()
        .map_err(eof_as(CodecError::TruncatedHeader))?;
    let declared = reader
        .read_u32::<LittleEndian>()
        .map_err(eof_as(CodecError::TruncatedHeader))?;

    Restore::<T, V>::check_header(table_size, declared)?;

    // Every slot carries a flag byte, so the slots are only allocated once
    // the input has proven to be that long.
    let mut entries = Vec::new();
    let mut value_buf = vec![0u8; V::WIDTH];
    for slot in 0..table_size {
        let truncated = |what| CodecError::TruncatedSlot { what, slot };

        match reader.read_u8().map_err(eof_as(truncated("flag")))? {
            VACANT => continue,
            OCCUPIED => {}
            flag => return Err(CodecError::InvalidFlag { flag, slot }),
        }

        let key_len = reader
            .read_u32::<LittleEndian>()
            .map_err(eof_as(truncated("key length")))?;
        let mut key = Vec::new();
        reader
            .by_ref()
            .take(u64::from(key_len))
            .read_to_end(&mut key)?;
        if key.len() != key_len as usize {
            return Err(truncated("key"));
        }
        let key = String::from_utf8(key).map_err(|_| CodecError::InvalidKey { slot })?;

        reader
            .read_exact(&mut value_buf)
            .map_err(eof_as(truncated("value")))?;
        let value = V::decode(&value_buf).ok_or(CodecError::InvalidValue { slot })?;

        entries.push((slot, key, value));
    }

    let mut restore = Restore::<T, V>::new(table_size, declared)?;
    for (slot, key, value) in entries {
        restore.place(slot, key, value)?;
    }
    restore.finish()
}

macro_rules! binary_methods {
    ($table:ident) => {
        impl<V: FixedWidthValue> $table<V> {
            /// Writes the table in the binary format.
            pub fn write_binary<W: Write>(&self, writer: W) -> Result<(), CodecError> {
                write_table(self, writer)
            }

            /// Writes the table in the binary format to a new file at
            /// `path`, replacing any existing file.
            pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
                write_table(self, BufWriter::new(File::create(path)?))
            }

            /// Reads a table in the binary format.
            ///
            /// The table keeps the recorded size and every entry stays at
            /// its recorded slot. Bytes after the last slot are not read.
            pub fn read_binary<R: Read>(reader: R) -> Result<Self, CodecError> {
                read_table(reader)
            }

            /// Reads a table in the binary format from the file at `path`.
            pub fn load_binary(path: impl AsRef<Path>) -> Result<Self, CodecError> {
                read_table(BufReader::new(File::open(path)?))
            }
        }
    };
}

binary_methods!(CuckooTable);
binary_methods!(DoubleHashTable);

#[cfg(test)]
mod tests {
    use super::*;

    // Size 2, one entry: "a" -> 7 at slot 1.
    const SINGLE_ENTRY: [u8; 19] = [
        2, 0, 0, 0, // table size
        1, 0, 0, 0, // element count
        0, // slot 0
        1, 1, 0, 0, 0, b'a', 7, 0, 0, 0, // slot 1
    ];

    #[test]
    fn writes_documented_layout() {
        let mut table = CuckooTable::new(2);
        table.insert("a", 7u32);

        let mut out = Vec::new();
        table.write_binary(&mut out).unwrap();
        assert_eq!(out, SINGLE_ENTRY);
    }

    #[test]
    fn reads_documented_layout() {
        let table = CuckooTable::<u32>::read_binary(&SINGLE_ENTRY[..]).unwrap();
        assert_eq!(table.table_size(), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find("a"), Some(&7));
    }

    #[test]
    fn truncation_is_reported_by_field() {
        let read = |bytes: &[u8]| CuckooTable::<u32>::read_binary(bytes).unwrap_err();

        assert!(matches!(read(&SINGLE_ENTRY[..6]), CodecError::TruncatedHeader));
        assert!(matches!(
            read(&SINGLE_ENTRY[..9]),
            CodecError::TruncatedSlot {
                what: "flag",
                slot: 1
            }
        ));
        assert!(matches!(
            read(&SINGLE_ENTRY[..12]),
            CodecError::TruncatedSlot {
                what: "key length",
                slot: 1
            }
        ));
        assert!(matches!(
            read(&SINGLE_ENTRY[..14]),
            CodecError::TruncatedSlot { what: "key", slot: 1 }
        ));
        assert!(matches!(
            read(&SINGLE_ENTRY[..17]),
            CodecError::TruncatedSlot {
                what: "value",
                slot: 1
            }
        ));
    }

    #[test]
    fn rejects_invalid_bytes() {
        let mut bad_flag = SINGLE_ENTRY;
        bad_flag[8] = 2;
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&bad_flag[..]),
            Err(CodecError::InvalidFlag { flag: 2, slot: 0 })
        ));

        let mut bad_key = SINGLE_ENTRY;
        bad_key[14] = 0xff;
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&bad_key[..]),
            Err(CodecError::InvalidKey { slot: 1 })
        ));

        // A bool is a single byte, so the value is the first byte after the key.
        let bool_bytes = [2, 0, 0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0, b'a', 3];
        assert!(matches!(
            CuckooTable::<bool>::read_binary(&bool_bytes[..]),
            Err(CodecError::InvalidValue { slot: 1 })
        ));

        let mut bad_count = SINGLE_ENTRY;
        bad_count[4] = 0;
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&bad_count[..]),
            Err(CodecError::CountMismatch {
                declared: 0,
                found: 1
            })
        ));
    }

    #[test]
    fn oversized_headers_fail_without_allocating() {
        // 4_000_000_000 slots and no slot data.
        let header = [0x00, 0x28, 0x6b, 0xee, 0, 0, 0, 0];
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&header[..]),
            Err(CodecError::TruncatedSlot {
                what: "flag",
                slot: 0
            })
        ));
        assert!(matches!(
            DoubleHashTable::<u32>::read_binary(&header[..]),
            Err(CodecError::TruncatedSlot {
                what: "flag",
                slot: 0
            })
        ));

        let more_entries_than_slots = [2, 0, 0, 0, 3, 0, 0, 0];
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&more_entries_than_slots[..]),
            Err(CodecError::MalformedHeader(_))
        ));
    }

    #[test]
    fn misplaced_entries_are_rejected() {
        // "a" can only live at slot 1 of a 2-slot table.
        let mut moved = [2, 0, 0, 0, 1, 0, 0, 0].to_vec();
        moved.extend([1, 1, 0, 0, 0, b'a', 7, 0, 0, 0, 0]);
        assert!(matches!(
            CuckooTable::<u32>::read_binary(&moved[..]),
            Err(CodecError::MisplacedEntry { index: 0, .. })
        ));
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();

        let cuckoo: CuckooTable<i64> = (0..300).map(|i| (format!("key{i}"), -i)).collect();
        let path = dir.path().join("cuckoo.bin");
        cuckoo.save_binary(&path).unwrap();
        let restored = CuckooTable::<i64>::load_binary(&path).unwrap();
        assert_eq!(restored.table_size(), cuckoo.table_size());
        assert_eq!(restored.len(), 300);
        for i in 0..300 {
            assert_eq!(restored.find(&format!("key{i}")), Some(&-i));
        }

        let mut double = DoubleHashTable::new(89).unwrap();
        for i in 0..150u16 {
            double.insert(format!("key{i}"), f64::from(i) / 2.0).unwrap();
        }
        let path = dir.path().join("double.bin");
        double.save_binary(&path).unwrap();
        let restored = DoubleHashTable::<f64>::load_binary(&path).unwrap();
        assert_eq!(restored.table_size(), double.table_size());
        assert_eq!(restored.len(), 150);
        assert_eq!(restored.find("key41"), Some(&20.5));
    }
}
