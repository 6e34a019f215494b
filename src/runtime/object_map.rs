//! Object entry storage.
//!
//! Small objects keep their entries in a flat vector and look keys up with a
//! linear scan. Once an object holds `object_hash_threshold` entries and a new
//! key arrives, it is promoted to an open-addressed table (64-bit FNV-1a,
//! linear probing, tombstones) that indexes into an insertion-ordered entry
//! vector. Enumeration order is insertion order in both modes. Objects never
//! demote.

use std::rc::Rc;

use crate::{config, runtime::value::Value};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const MIN_TABLE_CAPACITY: usize = 32;

pub fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: Rc<str>,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Linear,
    Hashed,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectMap {
    storage: Storage,
}

#[derive(Debug, Clone)]
enum Storage {
    Linear(Vec<ObjectEntry>),
    Hashed(HashedTable),
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Linear(Vec::new())
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Empty,
    Tombstone,
    Full(u32),
}

#[derive(Debug, Clone)]
struct HashedTable {
    /// Insertion order; `None` marks a removed entry until the next rebuild.
    entries: Vec<Option<ObjectEntry>>,
    slots: Vec<Slot>,
    live: usize,
    tombstones: usize,
}

enum Lookup {
    Found { slot: usize, entry: usize },
    Vacant { slot: usize },
}

impl HashedTable {
    fn with_entries(entries: Vec<ObjectEntry>) -> Self {
        let capacity = (entries.len() * 2)
            .max(MIN_TABLE_CAPACITY)
            .next_power_of_two();
        let mut table = HashedTable {
            entries: entries.into_iter().map(Some).collect(),
            slots: Vec::new(),
            live: 0,
            tombstones: 0,
        };
        table.rebuild(capacity);
        table
    }

    /// Compacts the entry vector and re-inserts every key into a fresh table.
    fn rebuild(&mut self, capacity: usize) {
        let entries: Vec<Option<ObjectEntry>> =
            self.entries.drain(..).flatten().map(Some).collect();
        self.slots = vec![Slot::Empty; capacity];
        self.live = entries.len();
        self.tombstones = 0;
        self.entries = entries;
        let mask = capacity - 1;
        for (index, entry) in self.entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            let mut slot = fnv1a(&entry.key) as usize & mask;
            while !matches!(self.slots[slot], Slot::Empty) {
                slot = (slot + 1) & mask;
            }
            self.slots[slot] = Slot::Full(index as u32);
        }
    }

    fn lookup(&self, key: &str) -> Lookup {
        let mask = self.slots.len() - 1;
        let mut slot = fnv1a(key) as usize & mask;
        let mut first_tombstone = None;
        loop {
            match self.slots[slot] {
                Slot::Empty => {
                    return Lookup::Vacant {
                        slot: first_tombstone.unwrap_or(slot),
                    };
                }
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(slot);
                }
                Slot::Full(index) => {
                    let index = index as usize;
                    if let Some(entry) = &self.entries[index] {
                        if &*entry.key == key {
                            return Lookup::Found { slot, entry: index };
                        }
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        match self.lookup(key) {
            Lookup::Found { entry, .. } => self.entries[entry].as_ref().map(|e| &e.value),
            Lookup::Vacant { .. } => None,
        }
    }

    fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        if let Lookup::Found { entry, .. } = self.lookup(key) {
            return self.entries[entry]
                .as_mut()
                .map(|e| std::mem::replace(&mut e.value, value));
        }
        let used = self.live + self.tombstones;
        if (used + 1) * 4 > self.slots.len() * 3 {
            let capacity = self.slots.len() * 2;
            log::trace!("object table resize {} -> {}", self.slots.len(), capacity);
            self.rebuild(capacity);
        }
        let Lookup::Vacant { slot } = self.lookup(key) else {
            return None;
        };
        if matches!(self.slots[slot], Slot::Tombstone) {
            self.tombstones -= 1;
        }
        self.slots[slot] = Slot::Full(self.entries.len() as u32);
        self.entries.push(Some(ObjectEntry {
            key: Rc::from(key),
            value,
        }));
        self.live += 1;
        None
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        let Lookup::Found { slot, entry } = self.lookup(key) else {
            return None;
        };
        self.slots[slot] = Slot::Tombstone;
        self.tombstones += 1;
        self.live -= 1;
        let removed = self.entries[entry].take().map(|e| e.value);
        if self.entries.len() - self.live > self.live.max(MIN_TABLE_CAPACITY) {
            self.rebuild(self.slots.len());
        }
        removed
    }

    fn iter(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.entries.iter().flatten()
    }
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts directly in hashed mode.
    pub fn hashed() -> Self {
        Self {
            storage: Storage::Hashed(HashedTable::with_entries(Vec::new())),
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self.storage {
            Storage::Linear(_) => StorageMode::Linear,
            Storage::Hashed(_) => StorageMode::Hashed,
        }
    }

    /// Slot count of the hash table; 0 in linear mode.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Linear(_) => 0,
            Storage::Hashed(table) => table.slots.len(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Linear(entries) => entries.len(),
            Storage::Hashed(table) => table.live,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.storage {
            Storage::Linear(entries) => entries
                .iter()
                .find(|e| &*e.key == key)
                .map(|e| &e.value),
            Storage::Hashed(table) => table.get(key),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites; returns the previous value.
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        let threshold = config::with(|c| c.object_hash_threshold);
        let promoted = match &mut self.storage {
            Storage::Linear(entries) => {
                if let Some(entry) = entries.iter_mut().find(|e| &*e.key == key) {
                    return Some(std::mem::replace(&mut entry.value, value));
                }
                if entries.len() < threshold {
                    entries.push(ObjectEntry {
                        key: Rc::from(key),
                        value,
                    });
                    return None;
                }
                log::trace!(
                    "object promoted to hashed storage at {} entries",
                    entries.len()
                );
                let mut table = HashedTable::with_entries(std::mem::take(entries));
                table.insert(key, value);
                table
            }
            Storage::Hashed(table) => return table.insert(key, value),
        };
        self.storage = Storage::Hashed(promoted);
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match &mut self.storage {
            Storage::Linear(entries) => {
                let index = entries.iter().position(|e| &*e.key == key)?;
                Some(entries.remove(index).value)
            }
            Storage::Hashed(table) => table.remove(key),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_> {
        match &self.storage {
            Storage::Linear(entries) => Box::new(entries.iter().map(|e| (&*e.key, &e.value))),
            Storage::Hashed(table) => Box::new(table.iter().map(|e| (&*e.key, &e.value))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        for (key, value) in iter {
            map.insert(key.as_ref(), value);
        }
        map
    }
}
