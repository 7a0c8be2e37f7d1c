//! Error taxonomy shared across the workspace.
//!
//! Every crate defines its own error enum with context-carrying variants.
//! Each of those maps onto one [`ErrorKind`], which is the stable,
//! crate-independent classification that callers match on.

use std::fmt;

/// Classification of a failure.
///
/// The numeric codes are stable and start at 1; 0 is reserved for success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An invariant was violated: GPU resource creation failed, a reference
    /// count underflowed, a hash chain is inconsistent, expected material
    /// data is missing, or an image format is unsupported.
    Internal,
    /// A reference lies outside a pool's valid index range.
    Bounds,
    /// A fixed-capacity pool is full.
    Exhausted,
    /// A formatted message exceeds a fixed buffer.
    TooLong,
    /// An I/O, decode or import failure.
    FileError,
    /// A required argument is missing.
    NullArgument,
}

impl ErrorKind {
    /// All kinds, in code order.
    pub const ALL: [ErrorKind; 6] = [
        Self::Internal,
        Self::Bounds,
        Self::Exhausted,
        Self::TooLong,
        Self::FileError,
        Self::NullArgument,
    ];

    /// Stable numeric code of this kind.
    pub fn code(&self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::Bounds => 2,
            Self::Exhausted => 3,
            Self::TooLong => 4,
            Self::FileError => 5,
            Self::NullArgument => 6,
        }
    }

    /// Look up a kind from its numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Fixed human-readable description of this kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Internal => "Internal error",
            Self::Bounds => "Out of bounds",
            Self::Exhausted => "Exhausted",
            Self::TooLong => "String too long",
            Self::FileError => "File error",
            Self::NullArgument => "Null argument",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Describe a raw result code, where 0 means success.
///
/// Unknown codes describe themselves as out of bounds.
pub fn describe_code(code: i32) -> &'static str {
    if code == 0 {
        return "Success";
    }
    ErrorKind::from_code(code).map_or(ErrorKind::Bounds.description(), |kind| {
        kind.description()
    })
}
