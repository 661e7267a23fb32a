mod arena_allocator;
mod dry_run_allocator;
mod error;

pub use arena_allocator::ArenaAllocator;
pub use dry_run_allocator::DryRunAllocator;
pub use error::AllocError;

use crate::DataType;

/// Every tensor starts on a multiple of this many bytes inside the arena.
pub const TENSOR_ALIGNMENT: usize = 32;

/// Handle to a tensor owned by an allocator. Only meaningful for the
/// allocator that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TensorId(usize);

impl TensorId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub label: String,
    pub shape: Box<[usize]>,
    pub data_type: DataType,
    pub offset: usize,
    pub size: usize,
}

pub trait TensorAllocator {
    fn alloc_tensor(
        &mut self,
        label: &str,
        shape: &[usize],
        data_type: DataType,
    ) -> Result<TensorId, AllocError>;

    /// Bytes consumed so far, alignment padding included.
    fn active_memory(&self) -> usize;

    fn num_tensors(&self) -> usize;
}

fn tensor_size_in_bytes(
    label: &str,
    shape: &[usize],
    data_type: DataType,
) -> Result<usize, AllocError> {
    shape
        .iter()
        .try_fold(data_type.size_in_bytes(), |size, &dim| size.checked_mul(dim))
        .ok_or_else(|| AllocError::SizeOverflow {
            label: label.to_string(),
        })
}

/// Places a tensor of `size` bytes at `current_offset` and returns the offset
/// one past its aligned end. Both allocators go through here so the dry run
/// consumes exactly what the arena will.
fn bump(
    label: &str,
    current_offset: usize,
    size: usize,
) -> Result<usize, AllocError> {
    size.checked_add(TENSOR_ALIGNMENT - 1)
        .map(|padded| padded & !(TENSOR_ALIGNMENT - 1))
        .and_then(|aligned_size| current_offset.checked_add(aligned_size))
        .ok_or_else(|| AllocError::SizeOverflow {
            label: label.to_string(),
        })
}
