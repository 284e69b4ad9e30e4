//! Collection schemas and the key index built over them.

use std::{borrow::Borrow, fmt, hash::Hash, marker::PhantomData};

use rustc_hash::FxHashMap;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{DeserializeOwned, IgnoredAny, MapAccess, SeqAccess, Visitor},
    ser::SerializeSeq,
};

/// Ordered collection of records addressable by a natural key.
pub trait Collection: Default {
    /// Natural key of a record.
    type Key: Eq + Hash + Clone + fmt::Debug;

    /// Stored record.
    type Record;

    /// Keys in document order.
    fn keys(&self) -> Vec<Self::Key>;

    /// Record at `position`.
    fn at(&self, position: usize) -> Option<&Self::Record>;

    /// Mutable record at `position`.
    fn at_mut(&mut self, position: usize) -> Option<&mut Self::Record>;

    /// Appends a record, returning its position.
    fn push(&mut self, key: Self::Key, record: Self::Record) -> usize;

    /// Removes the record at `position`, shifting later records down.
    fn remove_at(&mut self, position: usize) -> Option<Self::Record>;
}

/// A record that carries its own key.
pub trait Keyed {
    /// Natural key.
    fn key(&self) -> &str;
}

/// A collection document paired with its key → position index.
///
/// The index is only ever built from a document that was read successfully,
/// and is kept in step with every mutation made through this type.
#[derive(Debug, Clone)]
pub struct Table<C: Collection> {
    collection: C,
    index: FxHashMap<C::Key, usize>,
}

impl<C: Collection> Table<C> {
    /// Builds the index over `collection`.
    pub fn new(collection: C) -> Self {
        let index = build_index(&collection);

        Self { collection, index }
    }

    /// Underlying document.
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Consumes the table, returning the document.
    pub fn into_collection(self) -> C {
        self.collection
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the collection has no records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Position of `key` in the document.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        C::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    /// Whether a record with `key` exists.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        C::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Looks up a record by key.
    pub fn get<Q>(&self, key: &Q) -> Option<&C::Record>
    where
        C::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position(key)
            .and_then(|position| self.collection.at(position))
    }

    /// Looks up a record by key for modification in place.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut C::Record>
    where
        C::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position(key)
            .and_then(|position| self.collection.at_mut(position))
    }

    /// Inserts or replaces the record for `key`, returning the previous one.
    pub fn upsert(&mut self, key: C::Key, record: C::Record) -> Option<C::Record> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, record));
        }

        let position = self.collection.push(key.clone(), record);

        self.index.insert(key, position);

        None
    }

    /// Removes the record for `key` and rebuilds the index.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<C::Record>
    where
        C::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.position(key)?;
        let removed = self.collection.remove_at(position);

        self.index = build_index(&self.collection);

        removed
    }
}

impl<V> Table<UserMap<Vec<V>>> {
    /// Removes every line of `user` matching `predicate`.
    ///
    /// Once the user's sequence is empty the user key itself is removed, so
    /// no empty containers are ever persisted.
    pub fn remove_lines<F>(&mut self, user: &str, mut predicate: F) -> Vec<V>
    where
        F: FnMut(&V) -> bool,
    {
        let Some(lines) = self.get_mut(user) else {
            return Vec::new();
        };

        let (removed, kept): (Vec<V>, Vec<V>) =
            std::mem::take(lines).into_iter().partition(|line| predicate(line));

        *lines = kept;

        if lines.is_empty() {
            self.remove(user);
        }

        removed
    }
}

impl<C: Collection> Default for Table<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Collection + PartialEq> PartialEq for Table<C> {
    fn eq(&self, other: &Self) -> bool {
        self.collection == other.collection
    }
}

impl<C: Collection + Serialize> Serialize for Table<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.collection.serialize(serializer)
    }
}

impl<'de, C: Collection + DeserializeOwned> Deserialize<'de> for Table<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        C::deserialize(deserializer).map(Self::new)
    }
}

fn build_index<C: Collection>(collection: &C) -> FxHashMap<C::Key, usize> {
    collection
        .keys()
        .into_iter()
        .enumerate()
        .map(|(position, key)| (key, position))
        .collect()
}

/// Flat list of self-keyed records, stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordList<T>(Vec<T>);

impl<T> RecordList<T> {
    /// Records in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for RecordList<T> {
    fn from(records: Vec<T>) -> Self {
        Self(records)
    }
}

impl<T: Keyed> Collection for RecordList<T> {
    type Key = String;
    type Record = T;

    fn keys(&self) -> Vec<String> {
        self.0.iter().map(|record| record.key().to_owned()).collect()
    }

    fn at(&self, position: usize) -> Option<&T> {
        self.0.get(position)
    }

    fn at_mut(&mut self, position: usize) -> Option<&mut T> {
        self.0.get_mut(position)
    }

    fn push(&mut self, _key: String, record: T) -> usize {
        self.0.push(record);

        self.0.len() - 1
    }

    fn remove_at(&mut self, position: usize) -> Option<T> {
        (position < self.0.len()).then(|| self.0.remove(position))
    }
}

/// Per-user mapping, stored as a one-element JSON array wrapping an object
/// keyed by user id (`[{"<user>": ...}]`).
///
/// Entries keep the order in which they appear in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> UserMap<V> {
    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(user, value)| (user.as_str(), value))
    }
}

impl<V> Default for UserMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> FromIterator<(String, V)> for UserMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut table = Table::new(Self::default());

        for (user, value) in iter {
            table.upsert(user, value);
        }

        table.into_collection()
    }
}

impl<V> Collection for UserMap<V> {
    type Key = String;
    type Record = V;

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(user, _)| user.clone()).collect()
    }

    fn at(&self, position: usize) -> Option<&V> {
        self.entries.get(position).map(|(_, value)| value)
    }

    fn at_mut(&mut self, position: usize) -> Option<&mut V> {
        self.entries.get_mut(position).map(|(_, value)| value)
    }

    fn push(&mut self, key: String, record: V) -> usize {
        self.entries.push((key, record));

        self.entries.len() - 1
    }

    fn remove_at(&mut self, position: usize) -> Option<V> {
        (position < self.entries.len()).then(|| self.entries.remove(position).1)
    }
}

struct EntriesRef<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for EntriesRef<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(user, value)| (user, value)))
    }
}

impl<V: Serialize> Serialize for UserMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1))?;

        seq.serialize_element(&EntriesRef(&self.entries))?;

        seq.end()
    }
}

struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an object keyed by user id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((user, value)) = map.next_entry::<String, V>()? {
                    match entries.iter_mut().find(|(existing, _)| *existing == user) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((user, value)),
                    }
                }

                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UserMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UserMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UserMapVisitor<V> {
            type Value = UserMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a one-element array wrapping an object keyed by user id")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let entries = seq.next_element::<Entries<V>>()?.map(|e| e.0).unwrap_or_default();

                while seq.next_element::<IgnoredAny>()?.is_some() {}

                Ok(UserMap { entries })
            }
        }

        deserializer.deserialize_seq(UserMapVisitor(PhantomData))
    }
}
