//! Line-oriented text persistence.
//!
//! ```text
//! <table size> <element count>
//! <slot index> <key> <value>
//! ...
//! ```
//!
//! One line per occupied slot, in slot order. Keys may not be empty or
//! contain whitespace; values are written with [`Display`] and read back
//! with [`FromStr`], and their text must fit on one line. Blank lines are
//! ignored when reading.
//!
//! Reading rebuilds the table at the recorded slots without rehashing, so
//! a table that was written and read back probes exactly like the
//! original.

use core::fmt::Display;
use core::str::FromStr;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::codec::Restore;
use crate::error::CodecError;
use crate::slots::SlotTable;
use crate::CuckooTable;
use crate::DoubleHashTable;

fn write_table<T, V, W>(table: &T, mut writer: W) -> Result<(), CodecError>
where
    T: SlotTable<V>,
    V: Display,
    W: Write,
{
    let slots = table.slots();
    writeln!(writer, "{} {}", slots.table_size(), slots.len())?;

    for (index, entry) in slots.occupied() {
        if entry.key.is_empty() {
            return Err(CodecError::UnencodableKey {
                key: entry.key.clone(),
                reason: "empty keys cannot be written as text",
            });
        }
        if entry.key.contains(char::is_whitespace) {
            return Err(CodecError::UnencodableKey {
                key: entry.key.clone(),
                reason: "keys written as text may not contain whitespace",
            });
        }

        let value = entry.value.to_string();
        if value.contains(['\n', '\r']) {
            return Err(CodecError::UnencodableValue {
                key: entry.key.clone(),
            });
        }

        writeln!(writer, "{} {} {}", index, entry.key, value)?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_header(line: &str) -> Result<(u32, u32), CodecError> {
    let mut fields = line.split_whitespace();
    let (Some(size), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(CodecError::MalformedHeader(format!(
            "expected `<table size> <element count>`, found `{line}`"
        )));
    };

    let size = size
        .parse()
        .map_err(|err| CodecError::MalformedHeader(format!("table size `{size}`: {err}")))?;
    let count = count
        .parse()
        .map_err(|err| CodecError::MalformedHeader(format!("element count `{count}`: {err}")))?;
    Ok((size, count))
}

fn parse_entry<V>(line_number: usize, line: &str) -> Result<(u32, String, V), CodecError>
where
    V: FromStr,
    V::Err: Display,
{
    let malformed = |reason: String| CodecError::MalformedEntry {
        line: line_number,
        reason,
    };

    let line = line.trim_start();
    let (index, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected `<slot index> <key> <value>`".into()))?;
    let (key, value) = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed("missing value".into()))?;

    let index = index
        .parse()
        .map_err(|err| malformed(format!("slot index `{index}`: {err}")))?;
    let value = value
        .parse()
        .map_err(|err| malformed(format!("value `{value}`: {err}")))?;
    Ok((index, key.to_string(), value))
}

fn read_table<T, V, R>(reader: R) -> Result<T, CodecError>
where
    T: SlotTable<V>,
    V: FromStr,
    V::Err: Display,
    R: Read,
{
    let mut lines = BufReader::new(reader).lines().enumerate();

    let (table_size, declared) = loop {
        match lines.next() {
            None => return Err(CodecError::TruncatedHeader),
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break parse_header(&line)?;
                }
            }
        }
    };

    let mut restore = Restore::<T, V>::new(table_size, declared)?;
    for (number, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (index, key, value) = parse_entry(number + 1, &line)?;
        restore.place(index, key, value)?;
    }
    restore.finish()
}

macro_rules! text_methods {
    ($table:ident) => {
        impl<V: Display> $table<V> {
            /// Writes the table in the text format.
            ///
            /// Fails with [`CodecError::UnencodableKey`] or
            /// [`CodecError::UnencodableValue`] when an entry cannot be
            /// represented; anything written up to that point is left in
            /// `writer`.
            pub fn write_text<W: Write>(&self, writer: W) -> Result<(), CodecError> {
                write_table(self, writer)
            }

            /// Writes the table in the text format to a new file at `path`,
            /// replacing any existing file.
            pub fn save_text(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
                write_table(self, BufWriter::new(File::create(path)?))
            }
        }

        impl<V> $table<V>
        where
            V: FromStr,
            V::Err: Display,
        {
            /// Reads a table in the text format.
            ///
            /// The table keeps the recorded size and every entry stays at
            /// its recorded slot.
            pub fn read_text<R: Read>(reader: R) -> Result<Self, CodecError> {
                read_table(reader)
            }

            /// Reads a table in the text format from the file at `path`.
            pub fn load_text(path: impl AsRef<Path>) -> Result<Self, CodecError> {
                read_table(File::open(path)?)
            }
        }
    };
}

text_methods!(CuckooTable);
text_methods!(DoubleHashTable);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableError;

    fn written<V: Display>(table: &CuckooTable<V>) -> String {
        let mut out = Vec::new();
        table.write_text(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_header_then_occupied_slots() {
        let mut table = CuckooTable::new(2);
        table.insert("a", 7);
        assert_eq!(written(&table), "2 1\n1 a 7\n");

        let empty: CuckooTable<i32> = CuckooTable::new(5);
        assert_eq!(written(&empty), "5 0\n");
    }

    #[test]
    fn reads_back_at_recorded_slots() {
        let mut table = CuckooTable::new(2);
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            table.insert(key, i as u64);
        }

        let restored: CuckooTable<u64> =
            CuckooTable::read_text(written(&table).as_bytes()).unwrap();
        assert_eq!(restored.table_size(), table.table_size());
        assert_eq!(restored.len(), table.len());
        assert_eq!(restored.find("c"), Some(&2));
        assert_eq!(written(&restored), written(&table));
    }

    #[test]
    fn values_may_contain_spaces() {
        let mut table = DoubleHashTable::new(11).unwrap();
        table.insert("greeting", String::from("hello there")).unwrap();

        let mut out = Vec::new();
        table.write_text(&mut out).unwrap();
        let restored: DoubleHashTable<String> = DoubleHashTable::read_text(&out[..]).unwrap();
        assert_eq!(
            restored.find("greeting").map(String::as_str),
            Some("hello there")
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\n2 1\n\n1 a 7\n\n";
        let table = CuckooTable::<i32>::read_text(text.as_bytes()).unwrap();
        assert_eq!(table.find("a"), Some(&7));
    }

    #[test]
    fn rejects_malformed_input() {
        let read = |text: &str| CuckooTable::<i32>::read_text(text.as_bytes()).unwrap_err();

        assert!(matches!(read(""), CodecError::TruncatedHeader));
        assert!(matches!(read("2\n"), CodecError::MalformedHeader(_)));
        assert!(matches!(read("two 1\n"), CodecError::MalformedHeader(_)));
        assert!(matches!(read("2 1 9\n"), CodecError::MalformedHeader(_)));
        assert!(matches!(
            read("1 0\n"),
            CodecError::Table(TableError::InvalidSize { requested: 1 })
        ));
        assert!(matches!(
            read("2 1\n1 a\n"),
            CodecError::MalformedEntry { line: 2, .. }
        ));
        assert!(matches!(
            read("2 1\n1 a seven\n"),
            CodecError::MalformedEntry { line: 2, .. }
        ));
        assert!(matches!(
            read("2 1\n2 a 7\n"),
            CodecError::IndexOutOfBounds {
                index: 2,
                table_size: 2
            }
        ));
        assert!(matches!(
            read("5 1\n0 a 1\n"),
            CodecError::MisplacedEntry { index: 0, .. }
        ));
        assert!(matches!(
            read("2 2\n1 a 7\n"),
            CodecError::CountMismatch {
                declared: 2,
                found: 1
            }
        ));
    }

    /// A value whose slots are each over 2 GiB.
    #[allow(dead_code)]
    struct Huge([u8; 1 << 31]);

    impl FromStr for Huge {
        type Err = String;

        fn from_str(_: &str) -> Result<Self, Self::Err> {
            Err("never parsed".into())
        }
    }

    #[test]
    fn oversized_headers_are_errors() {
        let err = CuckooTable::<Huge>::read_text("4294967295 0\n".as_bytes()).err().unwrap();
        assert!(matches!(
            err,
            CodecError::Table(TableError::TooLarge {
                requested: u32::MAX
            })
        ));
        let err = DoubleHashTable::<Huge>::read_text("4294967295 0\n".as_bytes())
            .err()
            .unwrap();
        assert!(matches!(err, CodecError::Table(TableError::TooLarge { .. })));

        let err = CuckooTable::<u32>::read_text("4000000000 4000000001\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHeader(_)));
    }

    #[test]
    fn double_hash_reads_check_the_probe_sequence() {
        // "b" at 9 slots only ever probes 5, 8 and 2.
        let err = DoubleHashTable::<i32>::read_text("9 1\n0 b 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MisplacedEntry { index: 0, .. }));

        let table = DoubleHashTable::<i32>::read_text("9 1\n8 b 1\n".as_bytes()).unwrap();
        assert_eq!(table.find("b"), Some(&1));
    }

    #[test]
    fn rejects_unencodable_entries() {
        let mut table = CuckooTable::new(11);
        table.insert("two words", 1);
        let err = table.write_text(Vec::new()).unwrap_err();
        assert!(matches!(err, CodecError::UnencodableKey { .. }));

        let mut table = CuckooTable::new(11);
        table.insert("", 1);
        let err = table.write_text(Vec::new()).unwrap_err();
        assert!(matches!(err, CodecError::UnencodableKey { .. }));

        let mut table = CuckooTable::new(11);
        table.insert("poem", String::from("roses\nviolets"));
        let err = table.write_text(Vec::new()).unwrap_err();
        assert!(matches!(err, CodecError::UnencodableValue { .. }));
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");

        let mut table = DoubleHashTable::new(89).unwrap();
        for i in 0..50u32 {
            table.insert(format!("key{i}"), i).unwrap();
        }
        table.save_text(&path).unwrap();

        let restored = DoubleHashTable::<u32>::load_text(&path).unwrap();
        assert_eq!(restored.len(), 50);
        assert_eq!(restored.table_size(), table.table_size());
        for i in 0..50u32 {
            assert_eq!(restored.find(&format!("key{i}")), Some(&i));
        }

        let missing = CuckooTable::<u32>::load_text(dir.path().join("missing.txt"));
        assert!(matches!(missing, Err(CodecError::Io(_))));
    }
}
