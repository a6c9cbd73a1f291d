//! NBT (Named Binary Tag) tree model and binary codec.
//!
//! Supports two disk layouts:
//! - **Big-endian**: Java Edition region files. Numbers are big-endian, string lengths are u16.
//! - **Little-endian**: Bedrock Edition storage. Same structure with little-endian numbers.

mod be;
mod compound;
pub mod error;
mod io;
mod le;
pub mod tag;

pub use compound::NbtCompound;
pub use error::NbtError;
pub use tag::{NbtList, NbtRoot, NbtTag, TagKind};

use bytes::{Buf, BufMut};

/// Read big-endian (Java Edition) NBT from a buffer.
pub fn read_nbt_be(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<be::BeVariant>(buf)
}

/// Write big-endian (Java Edition) NBT to a buffer.
pub fn write_nbt_be(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    io::write_nbt::<be::BeVariant>(buf, root)
}

/// Read standard little-endian NBT from a buffer.
pub fn read_nbt_le(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<le::LeVariant>(buf)
}

/// Write standard little-endian NBT to a buffer.
pub fn write_nbt_le(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    io::write_nbt::<le::LeVariant>(buf, root)
}
