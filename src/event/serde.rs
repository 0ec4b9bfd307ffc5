//! `Key` is written by name (`KEY_A`) in human-readable formats and as its raw code otherwise.
//! Codes without a name fall back to the raw code in both.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::event::Key;

struct KeyVisitor;

impl de::Visitor<'_> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key name or raw key code")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    // Narrower integers are forwarded here by serde.
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        u16::try_from(v)
            .map(Key::from_raw)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(KeyVisitor)
        } else {
            u16::deserialize(deserializer).map(Key::from_raw)
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) if serializer.is_human_readable() => serializer.collect_str(&name),
            _ => self.raw().serialize(serializer),
        }
    }
}
