use super::{
    AllocError, TensorAllocator, TensorId, bump, tensor_size_in_bytes,
};
use crate::DataType;

/// Shape-only allocator: walks the same placement rules as
/// [`super::ArenaAllocator`] without reserving any memory.
#[derive(Debug, Default)]
pub struct DryRunAllocator {
    current_offset: usize,
    num_tensors: usize,
}

impl DryRunAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TensorAllocator for DryRunAllocator {
    fn alloc_tensor(
        &mut self,
        label: &str,
        shape: &[usize],
        data_type: DataType,
    ) -> Result<TensorId, AllocError> {
        let size = tensor_size_in_bytes(label, shape, data_type)?;
        self.current_offset = bump(label, self.current_offset, size)?;
        let id = TensorId(self.num_tensors);
        self.num_tensors += 1;
        Ok(id)
    }

    fn active_memory(&self) -> usize {
        self.current_offset
    }

    fn num_tensors(&self) -> usize {
        self.num_tensors
    }
}

#[cfg(test)]
mod tests {
    use super::{super::ArenaAllocator, *};

    #[test]
    fn test_dry_run_matches_arena_consumption() {
        let shapes: [&[usize]; 4] = [&[7], &[512, 512], &[1], &[3, 5]];

        let mut dry_run = DryRunAllocator::new();
        for (index, shape) in shapes.iter().enumerate() {
            dry_run
                .alloc_tensor(&format!("t{index}"), shape, DataType::F32)
                .unwrap();
        }

        let mut arena = ArenaAllocator::new(dry_run.active_memory()).unwrap();
        for (index, shape) in shapes.iter().enumerate() {
            arena
                .alloc_tensor(&format!("t{index}"), shape, DataType::F32)
                .unwrap();
        }

        assert_eq!(arena.active_memory(), dry_run.active_memory());
        assert_eq!(arena.available(), 0);
        assert_eq!(dry_run.num_tensors(), 4);
    }
}
