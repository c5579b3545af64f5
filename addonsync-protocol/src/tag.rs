//! Named tag trees carried inside property schema packets.
//!
//! Encoding follows the network little-endian variant: ints are zigzag
//! varints, string lengths are unsigned varints, list lengths are zigzag
//! varints and floats are little-endian IEEE 754.

use crate::error::ProtocolError;
use std::collections::BTreeMap;

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_INT: u8 = 3;
const TAG_FLOAT: u8 = 5;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;

/// A single tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Int(i32),
    Float(f32),
    String(String),
    List(Vec<Tag>),
    Compound(CompoundTag),
}

impl Tag {
    const fn type_id(&self) -> u8 {
        match self {
            Self::Byte(_) => TAG_BYTE,
            Self::Int(_) => TAG_INT,
            Self::Float(_) => TAG_FLOAT,
            Self::String(_) => TAG_STRING,
            Self::List(_) => TAG_LIST,
            Self::Compound(_) => TAG_COMPOUND,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
        match self {
            Self::Byte(v) => out.push(*v as u8),
            Self::Int(v) => write_var_i32(out, *v),
            Self::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::String(s) => write_string(out, s)?,
            Self::List(items) => {
                let elem = items.first().map_or(TAG_END, Tag::type_id);
                if let Some(bad) = items.iter().find(|t| t.type_id() != elem) {
                    return Err(ProtocolError::HeterogeneousList {
                        expected: elem,
                        found: bad.type_id(),
                    });
                }
                out.push(elem);
                let len = i32::try_from(items.len())
                    .map_err(|_| ProtocolError::ListTooLong(items.len()))?;
                write_var_i32(out, len);
                for item in items {
                    item.write_payload(out)?;
                }
            }
            Self::Compound(c) => c.write_payload(out)?,
        }
        Ok(())
    }
}

/// An ordered map of named tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundTag {
    entries: BTreeMap<String, Tag>,
}

impl CompoundTag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, tag: Tag) -> Self {
        self.entries.insert(name.into(), tag);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.entries.insert(name.into(), tag)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(Tag::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[Tag]> {
        match self.entries.get(name) {
            Some(Tag::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encodes this compound as an unnamed root tag.
    pub fn encode_network(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(64);
        out.push(TAG_COMPOUND);
        write_string(&mut out, "")?;
        self.write_payload(&mut out)?;
        Ok(out)
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
        for (name, tag) in &self.entries {
            out.push(tag.type_id());
            write_string(out, name)?;
            tag.write_payload(out)?;
        }
        out.push(TAG_END);
        Ok(())
    }
}

fn write_var_u32(out: &mut Vec<u8>, mut v: u32) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_var_i32(out: &mut Vec<u8>, v: i32) {
    write_var_u32(out, ((v << 1) ^ (v >> 31)) as u32);
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<(), ProtocolError> {
    let len = u32::try_from(s.len()).map_err(|_| ProtocolError::StringTooLong(s.len()))?;
    write_var_u32(out, len);
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zigzag_varints() {
        let mut out = Vec::new();
        write_var_i32(&mut out, 0);
        write_var_i32(&mut out, -1);
        write_var_i32(&mut out, 1);
        write_var_i32(&mut out, 64);
        assert_eq!(out, vec![0x00, 0x01, 0x02, 0x80, 0x01]);
    }

    #[test]
    fn encodes_small_compound() {
        let tag = CompoundTag::new()
            .with("max", Tag::Int(3))
            .with("name", Tag::String("a".into()));
        let bytes = tag.encode_network().unwrap();
        assert_eq!(
            bytes,
            vec![
                TAG_COMPOUND, 0x00, // root, empty name
                TAG_INT, 0x03, b'm', b'a', b'x', 0x06, // max = 3
                TAG_STRING, 0x04, b'n', b'a', b'm', b'e', 0x01, b'a', // name = "a"
                TAG_END,
            ]
        );
    }

    #[test]
    fn empty_list_uses_end_element_type() {
        let tag = CompoundTag::new().with("l", Tag::List(vec![]));
        let bytes = tag.encode_network().unwrap();
        assert_eq!(bytes, vec![TAG_COMPOUND, 0x00, TAG_LIST, 0x01, b'l', TAG_END, 0x00, TAG_END]);
    }

    #[test]
    fn rejects_mixed_list() {
        let tag = CompoundTag::new().with("l", Tag::List(vec![Tag::Int(1), Tag::Float(1.0)]));
        assert!(matches!(
            tag.encode_network(),
            Err(ProtocolError::HeterogeneousList { expected: TAG_INT, found: TAG_FLOAT })
        ));
    }
}
