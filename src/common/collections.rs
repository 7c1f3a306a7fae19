//! Hash collections used across the crate.
//!
//! Window and slot ids are small integers we generate or receive from the
//! host, so the default SipHash buys nothing here.

pub use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
