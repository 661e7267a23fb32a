use std::fmt;

use bytemuck::{Pod, Zeroable};
use tracing::debug;

use super::{
    AllocError, TENSOR_ALIGNMENT, TensorAllocator, TensorId, TensorInfo, bump,
    tensor_size_in_bytes,
};
use crate::{ArrayElement, DataType};

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(32))]
struct ArenaBlock([u8; TENSOR_ALIGNMENT]);

const _: () = assert!(align_of::<ArenaBlock>() == TENSOR_ALIGNMENT);

/// Fixed-size region that owns the storage of every tensor in a model.
///
/// Tensors are bump-allocated and never freed individually; the whole arena
/// is released when it is dropped.
pub struct ArenaAllocator {
    blocks: Vec<ArenaBlock>,
    current_offset: usize,
    tensors: Vec<TensorInfo>,
}

impl ArenaAllocator {
    pub fn new(size: usize) -> Result<Self, AllocError> {
        let num_blocks = size.div_ceil(TENSOR_ALIGNMENT);
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(num_blocks).map_err(|error| {
            AllocError::AllocationFailed {
                size,
                reason: error.to_string(),
            }
        })?;
        blocks.resize(num_blocks, ArenaBlock::zeroed());
        debug!(capacity = num_blocks * TENSOR_ALIGNMENT, "created arena");

        Ok(Self {
            blocks,
            current_offset: 0,
            tensors: Vec::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.blocks.len() * TENSOR_ALIGNMENT
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.current_offset
    }

    pub fn tensors(&self) -> &[TensorInfo] {
        &self.tensors
    }

    pub fn info(
        &self,
        id: TensorId,
    ) -> Result<&TensorInfo, AllocError> {
        self.tensors.get(id.index()).ok_or(AllocError::UnknownTensor {
            index: id.index(),
        })
    }

    pub fn data(
        &self,
        id: TensorId,
    ) -> Result<&[u8], AllocError> {
        let info = self.info(id)?;
        let bytes: &[u8] = bytemuck::cast_slice(self.blocks.as_slice());
        Ok(&bytes[info.offset..info.offset + info.size])
    }

    pub fn data_mut(
        &mut self,
        id: TensorId,
    ) -> Result<&mut [u8], AllocError> {
        let (offset, size) = {
            let info = self.info(id)?;
            (info.offset, info.size)
        };
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(self.blocks.as_mut_slice());
        Ok(&mut bytes[offset..offset + size])
    }

    pub fn view<T: ArrayElement>(
        &self,
        id: TensorId,
    ) -> Result<&[T], AllocError> {
        self.check_data_type::<T>(id)?;
        Ok(bytemuck::cast_slice(self.data(id)?))
    }

    pub fn view_mut<T: ArrayElement>(
        &mut self,
        id: TensorId,
    ) -> Result<&mut [T], AllocError> {
        self.check_data_type::<T>(id)?;
        Ok(bytemuck::cast_slice_mut(self.data_mut(id)?))
    }

    fn check_data_type<T: ArrayElement>(
        &self,
        id: TensorId,
    ) -> Result<(), AllocError> {
        let info = self.info(id)?;
        if info.data_type != T::data_type() {
            return Err(AllocError::DataTypeMismatch {
                label: info.label.clone(),
                expected: T::data_type(),
                actual: info.data_type,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ArenaAllocator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("capacity", &self.capacity())
            .field("used", &self.current_offset)
            .field("num_tensors", &self.tensors.len())
            .finish()
    }
}

impl TensorAllocator for ArenaAllocator {
    fn alloc_tensor(
        &mut self,
        label: &str,
        shape: &[usize],
        data_type: DataType,
    ) -> Result<TensorId, AllocError> {
        let size = tensor_size_in_bytes(label, shape, data_type)?;
        let next_offset = bump(label, self.current_offset, size)?;
        if next_offset > self.capacity() {
            return Err(AllocError::ArenaExhausted {
                label: label.to_string(),
                requested: next_offset - self.current_offset,
                available: self.available(),
            });
        }

        let id = TensorId(self.tensors.len());
        debug!(label, offset = self.current_offset, size, "allocated tensor");
        self.tensors.push(TensorInfo {
            label: label.to_string(),
            shape: shape.into(),
            data_type,
            offset: self.current_offset,
            size,
        });
        self.current_offset = next_offset;
        Ok(id)
    }

    fn active_memory(&self) -> usize {
        self.current_offset
    }

    fn num_tensors(&self) -> usize {
        self.tensors.len()
    }
}

#[cfg(test)]
mod tests {
    use half::f16;

    use super::*;

    #[test]
    fn test_capacity_rounds_up_to_alignment() {
        let arena = ArenaAllocator::new(100).unwrap();
        assert_eq!(arena.capacity(), 128);
        assert_eq!(arena.available(), 128);
    }

    #[test]
    fn test_tensors_are_aligned_and_disjoint() {
        let mut arena = ArenaAllocator::new(1024).unwrap();
        let a = arena.alloc_tensor("a", &[3], DataType::F32).unwrap();
        let b = arena.alloc_tensor("b", &[2, 4], DataType::F16).unwrap();

        assert_eq!(arena.info(a).unwrap().offset, 0);
        assert_eq!(arena.info(a).unwrap().size, 12);
        assert_eq!(arena.info(b).unwrap().offset, TENSOR_ALIGNMENT);
        assert_eq!(arena.active_memory(), 2 * TENSOR_ALIGNMENT);
        assert_eq!(arena.num_tensors(), 2);

        arena.view_mut::<f32>(a).unwrap().copy_from_slice(&[1.0f32, 2.0, 3.0]);
        arena.view_mut::<f16>(b).unwrap().fill(f16::ONE);
        assert_eq!(arena.view::<f32>(a).unwrap(), &[1.0f32, 2.0, 3.0]);
        assert_eq!(arena.view::<f16>(b).unwrap().len(), 8);
    }

    #[test]
    fn test_exhaustion_fails_without_partial_allocation() {
        let mut arena = ArenaAllocator::new(64).unwrap();
        arena.alloc_tensor("fits", &[8], DataType::F32).unwrap();

        let error = arena.alloc_tensor("overflows", &[16], DataType::F32);
        assert_eq!(
            error,
            Err(AllocError::ArenaExhausted {
                label: "overflows".to_string(),
                requested: 64,
                available: 32,
            })
        );
        assert_eq!(arena.num_tensors(), 1);
        assert_eq!(arena.active_memory(), 32);
    }

    #[test]
    fn test_view_checks_data_type() {
        let mut arena = ArenaAllocator::new(64).unwrap();
        let id = arena.alloc_tensor("weight", &[4], DataType::F32).unwrap();
        assert!(matches!(
            arena.view::<i32>(id),
            Err(AllocError::DataTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_sized_arena_only_fits_empty_tensors() {
        let mut arena = ArenaAllocator::new(0).unwrap();
        assert!(arena.alloc_tensor("w", &[1], DataType::F32).is_err());
        assert!(arena.alloc_tensor("empty", &[0], DataType::F32).is_ok());
    }
}
