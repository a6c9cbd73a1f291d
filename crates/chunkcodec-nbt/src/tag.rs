//! NBT tag types.

use std::fmt;

use crate::compound::NbtCompound;
use crate::error::NbtError;

/// A named root compound (the root always has a name, often empty string).
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }
}

/// The kind of a tag, as encoded by its numeric type ID.
///
/// `End` never appears as a value; it is the declared element kind of empty
/// lists read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl TagKind {
    /// Numeric tag type ID (0-12).
    pub fn id(self) -> u8 {
        match self {
            TagKind::End => 0,
            TagKind::Byte => 1,
            TagKind::Short => 2,
            TagKind::Int => 3,
            TagKind::Long => 4,
            TagKind::Float => 5,
            TagKind::Double => 6,
            TagKind::ByteArray => 7,
            TagKind::String => 8,
            TagKind::List => 9,
            TagKind::Compound => 10,
            TagKind::IntArray => 11,
            TagKind::LongArray => 12,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, NbtError> {
        Ok(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            12 => TagKind::LongArray,
            _ => return Err(NbtError::UnknownTagType(id)),
        })
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagKind::End => "TAG_End",
            TagKind::Byte => "TAG_Byte",
            TagKind::Short => "TAG_Short",
            TagKind::Int => "TAG_Int",
            TagKind::Long => "TAG_Long",
            TagKind::Float => "TAG_Float",
            TagKind::Double => "TAG_Double",
            TagKind::ByteArray => "TAG_Byte_Array",
            TagKind::String => "TAG_String",
            TagKind::List => "TAG_List",
            TagKind::Compound => "TAG_Compound",
            TagKind::IntArray => "TAG_Int_Array",
            TagKind::LongArray => "TAG_Long_Array",
        };
        f.write_str(name)
    }
}

/// Represents any NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn kind(&self) -> TagKind {
        match self {
            NbtTag::Byte(_) => TagKind::Byte,
            NbtTag::Short(_) => TagKind::Short,
            NbtTag::Int(_) => TagKind::Int,
            NbtTag::Long(_) => TagKind::Long,
            NbtTag::Float(_) => TagKind::Float,
            NbtTag::Double(_) => TagKind::Double,
            NbtTag::ByteArray(_) => TagKind::ByteArray,
            NbtTag::String(_) => TagKind::String,
            NbtTag::List(_) => TagKind::List,
            NbtTag::Compound(_) => TagKind::Compound,
            NbtTag::IntArray(_) => TagKind::IntArray,
            NbtTag::LongArray(_) => TagKind::LongArray,
        }
    }

    /// Returns the numeric tag type ID (1-12).
    pub fn tag_type_id(&self) -> u8 {
        self.kind().id()
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            NbtTag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            NbtTag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            NbtTag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            NbtTag::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NbtList> {
        match self {
            NbtTag::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            NbtTag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            NbtTag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            NbtTag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    /// Widens any integral tag to `i64`. Section indices are stored as bytes
    /// in some eras and ints in others.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NbtTag::Byte(v) => Some(*v as i64),
            NbtTag::Short(v) => Some(*v as i64),
            NbtTag::Int(v) => Some(*v as i64),
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i8> for NbtTag {
    fn from(v: i8) -> Self {
        NbtTag::Byte(v)
    }
}

impl From<bool> for NbtTag {
    fn from(v: bool) -> Self {
        NbtTag::Byte(v as i8)
    }
}

impl From<i16> for NbtTag {
    fn from(v: i16) -> Self {
        NbtTag::Short(v)
    }
}

impl From<i32> for NbtTag {
    fn from(v: i32) -> Self {
        NbtTag::Int(v)
    }
}

impl From<i64> for NbtTag {
    fn from(v: i64) -> Self {
        NbtTag::Long(v)
    }
}

impl From<f32> for NbtTag {
    fn from(v: f32) -> Self {
        NbtTag::Float(v)
    }
}

impl From<f64> for NbtTag {
    fn from(v: f64) -> Self {
        NbtTag::Double(v)
    }
}

impl From<&str> for NbtTag {
    fn from(v: &str) -> Self {
        NbtTag::String(v.to_owned())
    }
}

impl From<String> for NbtTag {
    fn from(v: String) -> Self {
        NbtTag::String(v)
    }
}

impl From<NbtCompound> for NbtTag {
    fn from(v: NbtCompound) -> Self {
        NbtTag::Compound(v)
    }
}

impl From<NbtList> for NbtTag {
    fn from(v: NbtList) -> Self {
        NbtTag::List(v)
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Short(v) => write!(f, "{v}s"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::Long(v) => write!(f, "{v}L"),
            NbtTag::Float(v) => write!(f, "{v}f"),
            NbtTag::Double(v) => write!(f, "{v}d"),
            NbtTag::ByteArray(v) => write!(f, "[B; {} elements]", v.len()),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::List(v) => write!(f, "[{} elements]", v.len()),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
            NbtTag::IntArray(v) => write!(f, "[I; {} elements]", v.len()),
            NbtTag::LongArray(v) => write!(f, "[L; {} elements]", v.len()),
        }
    }
}

/// A homogeneous list. The element kind is fixed when the list is created.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtList {
    kind: TagKind,
    items: Vec<NbtTag>,
}

impl NbtList {
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Build a list from existing tags, checking each against `kind`.
    pub fn from_tags(kind: TagKind, tags: Vec<NbtTag>) -> Result<Self, NbtError> {
        let mut list = Self {
            kind,
            items: Vec::with_capacity(tags.len()),
        };
        for tag in tags {
            list.push(tag)?;
        }
        Ok(list)
    }

    /// Shorthand for a list of compounds, which cannot mismatch.
    pub fn of_compounds(items: impl IntoIterator<Item = NbtCompound>) -> Self {
        Self {
            kind: TagKind::Compound,
            items: items.into_iter().map(NbtTag::Compound).collect(),
        }
    }

    /// Used by the decoder, whose elements already match `kind`.
    pub(crate) fn from_parts(kind: TagKind, items: Vec<NbtTag>) -> Self {
        Self { kind, items }
    }

    pub fn element_kind(&self) -> TagKind {
        self.kind
    }

    pub fn push(&mut self, tag: NbtTag) -> Result<(), NbtError> {
        if tag.kind() != self.kind {
            return Err(NbtError::mismatch(
                format!("[{}]", self.items.len()),
                self.kind,
                tag.kind(),
            ));
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&NbtTag> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NbtTag> {
        self.items.iter()
    }

    /// Iterate the compound elements. A list of another kind yields nothing.
    pub fn compounds(&self) -> impl Iterator<Item = &NbtCompound> {
        self.items.iter().filter_map(NbtTag::as_compound)
    }

    pub fn into_vec(self) -> Vec<NbtTag> {
        self.items
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = std::slice::Iter<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_type_ids() {
        assert_eq!(NbtTag::Byte(0).tag_type_id(), 1);
        assert_eq!(NbtTag::Short(0).tag_type_id(), 2);
        assert_eq!(NbtTag::Int(0).tag_type_id(), 3);
        assert_eq!(NbtTag::Long(0).tag_type_id(), 4);
        assert_eq!(NbtTag::Float(0.0).tag_type_id(), 5);
        assert_eq!(NbtTag::Double(0.0).tag_type_id(), 6);
        assert_eq!(NbtTag::ByteArray(vec![]).tag_type_id(), 7);
        assert_eq!(NbtTag::String(String::new()).tag_type_id(), 8);
        assert_eq!(NbtTag::List(NbtList::new(TagKind::Int)).tag_type_id(), 9);
        assert_eq!(NbtTag::Compound(NbtCompound::new()).tag_type_id(), 10);
        assert_eq!(NbtTag::IntArray(vec![]).tag_type_id(), 11);
        assert_eq!(NbtTag::LongArray(vec![]).tag_type_id(), 12);
    }

    #[test]
    fn kind_id_roundtrip() {
        for id in 0..=12u8 {
            assert_eq!(TagKind::from_id(id).unwrap().id(), id);
        }
        assert!(matches!(
            TagKind::from_id(13),
            Err(NbtError::UnknownTagType(13))
        ));
    }

    #[test]
    fn accessors() {
        assert_eq!(NbtTag::Byte(42).as_byte(), Some(42));
        assert_eq!(NbtTag::Int(42).as_byte(), None);
        assert_eq!(NbtTag::String("hello".into()).as_string(), Some("hello"));
        assert_eq!(NbtTag::Int(5).as_string(), None);
        assert_eq!(NbtTag::Byte(-3).as_integer(), Some(-3));
        assert_eq!(NbtTag::Float(1.0).as_integer(), None);
    }

    #[test]
    fn list_rejects_other_kinds() {
        let mut list = NbtList::new(TagKind::Int);
        list.push(NbtTag::Int(1)).unwrap();
        let err = list.push(NbtTag::Long(2)).unwrap_err();
        assert!(matches!(
            err,
            NbtError::TypeMismatch {
                expected: TagKind::Int,
                found: TagKind::Long,
                ..
            }
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn empty_list_keeps_declared_kind() {
        let list = NbtList::new(TagKind::Compound);
        assert!(list.is_empty());
        assert_eq!(list.element_kind(), TagKind::Compound);
        assert_ne!(list, NbtList::new(TagKind::String));
    }

    #[test]
    fn from_tags_validates_every_element() {
        let ok = NbtList::from_tags(TagKind::Short, vec![NbtTag::Short(1), NbtTag::Short(2)]);
        assert_eq!(ok.unwrap().len(), 2);
        let bad = NbtList::from_tags(TagKind::Short, vec![NbtTag::Short(1), NbtTag::Int(2)]);
        assert!(bad.is_err());
    }
}
