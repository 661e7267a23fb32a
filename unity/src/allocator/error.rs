use std::fmt;

use crate::DataType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    ArenaExhausted {
        label: String,
        requested: usize,
        available: usize,
    },
    AllocationFailed {
        size: usize,
        reason: String,
    },
    SizeOverflow {
        label: String,
    },
    UnknownTensor {
        index: usize,
    },
    DataTypeMismatch {
        label: String,
        expected: DataType,
        actual: DataType,
    },
}

impl fmt::Display for AllocError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            AllocError::ArenaExhausted {
                label,
                requested,
                available,
            } => {
                write!(
                    f,
                    "Arena exhausted allocating \"{}\": requested {} bytes, {} available",
                    label, requested, available
                )
            },
            AllocError::AllocationFailed {
                size,
                reason,
            } => {
                write!(f, "Failed to allocate {} bytes: {}", size, reason)
            },
            AllocError::SizeOverflow {
                label,
            } => {
                write!(f, "Size of tensor \"{}\" overflows usize", label)
            },
            AllocError::UnknownTensor {
                index,
            } => {
                write!(f, "No tensor with index {} in this arena", index)
            },
            AllocError::DataTypeMismatch {
                label,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Tensor \"{}\" holds {:?}, viewed as {:?}",
                    label, actual, expected
                )
            },
        }
    }
}

impl std::error::Error for AllocError {}
