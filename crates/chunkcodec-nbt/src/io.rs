//! Generic NBT read/write engine, parameterized by variant.

use bytes::{Buf, BufMut};

use crate::compound::NbtCompound;
use crate::error::NbtError;
use crate::tag::{NbtList, NbtRoot, NbtTag, TagKind};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

/// Abstraction over the byte order of the two NBT disk layouts.
pub(crate) trait NbtVariant {
    fn write_short(buf: &mut impl BufMut, value: i16);
    fn read_short(buf: &mut impl Buf) -> i16;

    fn write_int(buf: &mut impl BufMut, value: i32);
    fn read_int(buf: &mut impl Buf) -> i32;

    fn write_long(buf: &mut impl BufMut, value: i64);
    fn read_long(buf: &mut impl Buf) -> i64;

    fn write_float(buf: &mut impl BufMut, value: f32);
    fn read_float(buf: &mut impl Buf) -> f32;

    fn write_double(buf: &mut impl BufMut, value: f64);
    fn read_double(buf: &mut impl Buf) -> f64;

    fn write_string_len(buf: &mut impl BufMut, len: u16);
    fn read_string_len(buf: &mut impl Buf) -> u16;
}

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

pub(crate) fn read_nbt<V: NbtVariant>(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    if !buf.has_remaining() {
        return Err(NbtError::UnexpectedEof);
    }
    let tag_type = buf.get_u8();
    if tag_type != TagKind::Compound.id() {
        return Err(NbtError::ExpectedCompound { got: tag_type });
    }
    let name = read_string::<V>(buf)?;
    let compound = read_compound::<V>(buf, 0)?;
    Ok(NbtRoot { name, compound })
}

fn read_tag<V: NbtVariant>(
    buf: &mut impl Buf,
    kind: TagKind,
    depth: usize,
) -> Result<NbtTag, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }

    match kind {
        TagKind::End => Err(NbtError::UnknownTagType(0)),
        TagKind::Byte => {
            ensure_remaining(buf, 1)?;
            Ok(NbtTag::Byte(buf.get_i8()))
        }
        TagKind::Short => {
            ensure_remaining(buf, 2)?;
            Ok(NbtTag::Short(V::read_short(buf)))
        }
        TagKind::Int => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Int(V::read_int(buf)))
        }
        TagKind::Long => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Long(V::read_long(buf)))
        }
        TagKind::Float => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Float(V::read_float(buf)))
        }
        TagKind::Double => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Double(V::read_double(buf)))
        }
        TagKind::ByteArray => {
            let len = read_array_len::<V>(buf)?;
            ensure_remaining(buf, len)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i8());
            }
            Ok(NbtTag::ByteArray(arr))
        }
        TagKind::String => Ok(NbtTag::String(read_string::<V>(buf)?)),
        TagKind::List => {
            ensure_remaining(buf, 1)?;
            let element_kind = TagKind::from_id(buf.get_u8())?;
            let len = read_array_len::<V>(buf)?;
            let mut items = Vec::with_capacity(len.min(buf.remaining()));
            for _ in 0..len {
                items.push(read_tag::<V>(buf, element_kind, depth + 1)?);
            }
            Ok(NbtTag::List(NbtList::from_parts(element_kind, items)))
        }
        TagKind::Compound => Ok(NbtTag::Compound(read_compound::<V>(buf, depth + 1)?)),
        TagKind::IntArray => {
            let len = read_array_len::<V>(buf)?;
            ensure_remaining(buf, len.saturating_mul(4))?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::read_int(buf));
            }
            Ok(NbtTag::IntArray(arr))
        }
        TagKind::LongArray => {
            let len = read_array_len::<V>(buf)?;
            ensure_remaining(buf, len.saturating_mul(8))?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::read_long(buf));
            }
            Ok(NbtTag::LongArray(arr))
        }
    }
}

fn read_compound<V: NbtVariant>(buf: &mut impl Buf, depth: usize) -> Result<NbtCompound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }
    let mut map = NbtCompound::new();
    loop {
        ensure_remaining(buf, 1)?;
        let kind = TagKind::from_id(buf.get_u8())?;
        if kind == TagKind::End {
            break;
        }
        let name = read_string::<V>(buf)?;
        let tag = read_tag::<V>(buf, kind, depth)?;
        // Duplicate names on disk: the last one wins.
        map.set(name, tag);
    }
    Ok(map)
}

fn read_array_len<V: NbtVariant>(buf: &mut impl Buf) -> Result<usize, NbtError> {
    ensure_remaining(buf, 4)?;
    let len = V::read_int(buf);
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

fn read_string<V: NbtVariant>(buf: &mut impl Buf) -> Result<String, NbtError> {
    ensure_remaining(buf, 2)?;
    let len = V::read_string_len(buf) as usize;
    ensure_remaining(buf, len)?;
    let data = buf.copy_to_bytes(len);
    String::from_utf8(data.to_vec()).map_err(|_| NbtError::InvalidUtf8)
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------

pub(crate) fn write_nbt<V: NbtVariant>(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    buf.put_u8(TagKind::Compound.id());
    write_string::<V>(buf, &root.name)?;
    write_compound::<V>(buf, &root.compound)
}

fn write_tag<V: NbtVariant>(buf: &mut impl BufMut, tag: &NbtTag) -> Result<(), NbtError> {
    match tag {
        NbtTag::Byte(v) => buf.put_i8(*v),
        NbtTag::Short(v) => V::write_short(buf, *v),
        NbtTag::Int(v) => V::write_int(buf, *v),
        NbtTag::Long(v) => V::write_long(buf, *v),
        NbtTag::Float(v) => V::write_float(buf, *v),
        NbtTag::Double(v) => V::write_double(buf, *v),
        NbtTag::ByteArray(arr) => {
            V::write_int(buf, arr.len() as i32);
            for &b in arr {
                buf.put_i8(b);
            }
        }
        NbtTag::String(s) => write_string::<V>(buf, s)?,
        NbtTag::List(list) => {
            buf.put_u8(list.element_kind().id());
            V::write_int(buf, list.len() as i32);
            for item in list {
                write_tag::<V>(buf, item)?;
            }
        }
        NbtTag::Compound(map) => write_compound::<V>(buf, map)?,
        NbtTag::IntArray(arr) => {
            V::write_int(buf, arr.len() as i32);
            for &v in arr {
                V::write_int(buf, v);
            }
        }
        NbtTag::LongArray(arr) => {
            V::write_int(buf, arr.len() as i32);
            for &v in arr {
                V::write_long(buf, v);
            }
        }
    }
    Ok(())
}

fn write_compound<V: NbtVariant>(buf: &mut impl BufMut, map: &NbtCompound) -> Result<(), NbtError> {
    for (name, tag) in map {
        buf.put_u8(tag.tag_type_id());
        write_string::<V>(buf, name)?;
        write_tag::<V>(buf, tag)?;
    }
    buf.put_u8(TagKind::End.id());
    Ok(())
}

fn write_string<V: NbtVariant>(buf: &mut impl BufMut, s: &str) -> Result<(), NbtError> {
    let len = u16::try_from(s.len()).map_err(|_| NbtError::StringTooLong { len: s.len() })?;
    V::write_string_len(buf, len);
    buf.put_slice(s.as_bytes());
    Ok(())
}
