/*! Serialization of pattern sequences.

A serialized sequence starts with the magic `REGP`, followed by a format
version byte and the bincode encoding of the entry tree. Types referenced
by entries are always written as type references (name and parameter),
even if the entry holds a resolved type, and are resolved again through
the type providers when the deserialized sequence is matched. Default
providers are not serialized either.
*/

use std::borrow::Cow;
use std::io::{BufWriter, Read, Write};
#[cfg(feature = "logging")]
use std::time::Instant;

use bincode::Options;
#[cfg(feature = "logging")]
use log::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checker::Checker;
use crate::entry::{Payload, PatternEntry, TypeRef};
use crate::errors::SerializationError;
use crate::quantifier::Quantifier;
use crate::seq::PatternSeq;

const MAGIC: &[u8] = b"REGP";
const VERSION: u8 = 1;

#[derive(Serialize)]
struct SeqRef<'a> {
    entries: Vec<EntryRef<'a>>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    name: Option<&'a str>,
    quantifier: Quantifier,
    payload: PayloadRef<'a>,
    second_stage: Option<&'a PatternSeq>,
}

// Variants must be kept in the same order as in `PayloadRepr`.
#[derive(Serialize)]
enum PayloadRef<'a> {
    Checker(&'a Checker),
    TypeRef(Cow<'a, TypeRef>),
}

#[derive(Deserialize)]
struct SeqRepr {
    entries: Vec<EntryRepr>,
}

#[derive(Deserialize)]
struct EntryRepr {
    name: Option<String>,
    quantifier: Quantifier,
    payload: PayloadRepr,
    second_stage: Option<PatternSeq>,
}

#[derive(Deserialize)]
enum PayloadRepr {
    Checker(Checker),
    TypeRef(TypeRef),
}

impl Serialize for PatternSeq {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self
            .entries()
            .iter()
            .map(|entry| EntryRef {
                name: entry.name(),
                quantifier: entry.quantifier(),
                payload: match entry.payload() {
                    Payload::Checker(checker) => PayloadRef::Checker(checker),
                    Payload::Type(ty) => {
                        PayloadRef::TypeRef(Cow::Owned(TypeRef::new(ty.name())))
                    }
                    Payload::TypeRef(type_ref) => {
                        PayloadRef::TypeRef(Cow::Borrowed(type_ref))
                    }
                },
                second_stage: entry.second_stage_seq().map(|s| &**s),
            })
            .collect();

        SeqRef { entries }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatternSeq {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = SeqRepr::deserialize(deserializer)?;
        Ok(repr
            .entries
            .into_iter()
            .map(|e| {
                let mut entry = match e.payload {
                    PayloadRepr::Checker(checker) => PatternEntry::new(checker),
                    PayloadRepr::TypeRef(type_ref) => {
                        PatternEntry::type_ref(type_ref)
                    }
                };
                if let Some(name) = &e.name {
                    entry = entry.named(name);
                }
                entry = entry.quantified(e.quantifier);
                if let Some(second_stage) = e.second_stage {
                    entry = entry.second_stage(second_stage);
                }
                entry
            })
            .collect())
    }
}

impl PatternSeq {
    /// Serializes the sequence as a sequence of bytes.
    ///
    /// The sequence can be restored back by passing the bytes to
    /// [`PatternSeq::deserialize`].
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes a sequence from bytes produced by
    /// [`PatternSeq::serialize`].
    pub fn deserialize<B>(bytes: B) -> Result<Self, SerializationError>
    where
        B: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();

        if bytes.len() < MAGIC.len() + 1 || &bytes[0..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        let version = bytes[MAGIC.len()];
        if version != VERSION {
            return Err(SerializationError::UnsupportedVersion(version));
        }

        #[cfg(feature = "logging")]
        let start = Instant::now();

        // Skip the header and deserialize the remaining data.
        let seq = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize::<PatternSeq>(&bytes[MAGIC.len() + 1..])?;

        #[cfg(feature = "logging")]
        info!("Deserialization time: {:?}", Instant::elapsed(&start));

        Ok(seq)
    }

    /// Serializes the sequence into a `writer`.
    pub fn serialize_into<W>(&self, writer: W) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);

        // Write header.
        writer.write_all(MAGIC)?;
        writer.write_all(&[VERSION])?;

        bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(&mut writer, self)?;

        writer.flush()?;
        Ok(())
    }

    /// Deserializes a sequence from a `reader`.
    pub fn deserialize_from<R>(mut reader: R) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Self::deserialize(bytes)
    }
}
