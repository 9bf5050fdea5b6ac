#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod cuckoo_table;
pub mod double_hash_table;
pub mod error;
pub mod hashing;

mod resize;
mod slots;

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        pub mod binary_format;
        pub mod text_format;

        mod codec;

        pub use binary_format::FixedWidthValue;
        pub use error::CodecError;
    }
}

pub use cuckoo_table::CuckooTable;
pub use double_hash_table::DoubleHashTable;
pub use error::TableError;
pub use slots::Iter;

#[cfg(any(test, feature = "stats"))]
pub use cuckoo_table::CuckooStats;
#[cfg(any(test, feature = "stats"))]
pub use double_hash_table::DoubleHashStats;
