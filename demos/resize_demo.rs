use std::collections::BTreeSet;

use clap::Parser;
use cuckoo_hash::CuckooTable;
use cuckoo_hash::DoubleHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "count", default_value_t = 1000)]
    count: usize,

    #[arg(short = 's', long = "initial_size", default_value_t = 11)]
    initial_size: u32,

    #[arg(long = "seed", default_value_t = 0)]
    seed: u64,
}

fn random_keys(count: usize, seed: u64) -> Vec<String> {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut keys = BTreeSet::new();
    while keys.len() < count {
        let key: String = (0..8)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect();
        keys.insert(key);
    }
    keys.into_iter().collect()
}

fn main() {
    let args = Args::parse();
    let keys = random_keys(args.count, args.seed);

    println!(
        "Inserting {} keys into tables starting at {} slots",
        keys.len(),
        args.initial_size
    );

    let mut cuckoo = CuckooTable::new(args.initial_size);
    for (i, key) in keys.iter().enumerate() {
        cuckoo.insert(key.as_str(), i);
    }
    cuckoo.stats().print();

    let mut double = match DoubleHashTable::new(args.initial_size) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("Cannot build double hashing table: {err}");
            return;
        }
    };

    for (i, key) in keys.iter().enumerate() {
        if let Err(err) = double.insert(key.as_str(), i) {
            eprintln!("Insert of `{key}` failed: {err}");
            return;
        }
    }
    double.stats().print();
}
