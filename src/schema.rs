//Copyright 2026 Aspectra Developers
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use camino::Utf8Path;
use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The type of one feature slot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// A numeric count/score.
    Numeric,
    /// A nominal slot over a closed value set.
    Nominal(Vec<CompactString>),
}

/// The frozen, ordered feature schema of one trained model.
///
/// Built exactly once per model by the schema builder; the vectorizer only
/// looks names up and never mutates it. Lookups return an `Option` so a
/// missing name is a typed outcome the caller has to handle, not a silent
/// no-op.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    slots: IndexMap<CompactString, SlotKind>,
}

impl FeatureSchema {
    /// Appends a slot. Returns `false` (and keeps the existing slot) when
    /// the name is already taken.
    pub(crate) fn reserve(&mut self, name: impl Into<CompactString>, kind: SlotKind) -> bool {
        let name = name.into();
        if self.slots.contains_key(&name) {
            log::debug!("The slot {name} is already reserved, keeping the first one.");
            return false;
        }
        self.slots.insert(name, kind);
        true
    }

    pub(crate) fn reserve_numeric(&mut self, name: impl Into<CompactString>) -> bool {
        self.reserve(name, SlotKind::Numeric)
    }

    /// The fixed position of [name], if the schema contains it.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.get_index_of(name)
    }

    pub fn kind(&self, name: &str) -> Option<&SlotKind> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompactString, &SlotKind)> {
        self.slots.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &CompactString> {
        self.slots.keys()
    }

    /// The exactly reproducible external form: an ordered list of
    /// (slot name, slot kind) pairs.
    pub fn to_persisted(&self) -> PersistedSchema {
        PersistedSchema {
            slots: self
                .slots
                .iter()
                .map(|(name, kind)| PersistedSlot {
                    name: name.clone(),
                    kind: kind.clone(),
                })
                .collect(),
        }
    }

    pub fn from_persisted(persisted: PersistedSchema) -> Self {
        let mut schema = Self::default();
        for slot in persisted.slots {
            schema.reserve(slot.name, slot.kind);
        }
        schema
    }
}

/// One persisted slot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedSlot {
    pub name: CompactString,
    pub kind: SlotKind,
}

/// The persisted form of a [FeatureSchema].
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedSchema {
    pub slots: Vec<PersistedSlot>,
}

impl PersistedSchema {
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, self)
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn write_to(&self, path: &Utf8Path) -> Result<(), std::io::Error> {
        let writer = BufWriter::new(
            File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        );
        self.write_json(writer).map_err(std::io::Error::from)
    }

    pub fn read_from(path: &Utf8Path) -> Result<Self, std::io::Error> {
        let reader = BufReader::new(File::options().read(true).open(path)?);
        Self::read_json(reader).map_err(std::io::Error::from)
    }

    pub fn names(&self) -> impl Iterator<Item = &CompactString> {
        self.slots.iter().map(|slot| &slot.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> FeatureSchema {
        let mut schema = FeatureSchema::default();
        schema.reserve_numeric("oid");
        schema.reserve_numeric("WF_good");
        schema.reserve(
            "polarity",
            SlotKind::Nominal(vec![
                CompactString::from("positive"),
                CompactString::from("negative"),
                CompactString::from("neutral"),
            ]),
        );
        schema
    }

    #[test]
    fn positions_follow_insertion_order() {
        let schema = sample();
        assert_eq!(schema.position("oid"), Some(0));
        assert_eq!(schema.position("WF_good"), Some(1));
        assert_eq!(schema.position("polarity"), Some(2));
        assert_eq!(schema.position("missing"), None);
    }

    #[test]
    fn duplicate_reservations_keep_the_first_slot() {
        let mut schema = sample();
        assert!(!schema.reserve_numeric("WF_good"));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn persisted_round_trip_is_exact() {
        let schema = sample();
        let mut buffer = Vec::new();
        schema.to_persisted().write_json(&mut buffer).unwrap();
        let read = PersistedSchema::read_json(buffer.as_slice()).unwrap();
        assert_eq!(FeatureSchema::from_persisted(read), schema);
    }
}
