//! NBT error types.

use thiserror::Error;

use crate::tag::TagKind;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("expected TAG_Compound (10) at root, got {got}")]
    ExpectedCompound { got: u8 },

    #[error("unknown tag type: {0}")]
    UnknownTagType(u8),

    #[error("invalid UTF-8 in NBT string")]
    InvalidUtf8,

    #[error("nesting too deep (limit: {limit})")]
    NestingTooDeep { limit: usize },

    #[error("negative array length: {0}")]
    NegativeLength(i32),

    #[error("string of {len} bytes does not fit a u16 length prefix")]
    StringTooLong { len: usize },

    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("key '{0}' already exists")]
    DuplicateKey(String),

    #[error("type mismatch at '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: TagKind,
        found: TagKind,
    },
}

impl NbtError {
    pub(crate) fn mismatch(key: impl Into<String>, expected: TagKind, found: TagKind) -> Self {
        NbtError::TypeMismatch {
            key: key.into(),
            expected,
            found,
        }
    }
}
