use bytemuck::Pod;
use half::{bf16, f16};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Copy,
    Clone,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    // Floating point
    BF16,
    F16,
    F32,
    F64,
    // Integers
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl DataType {
    pub fn size_in_bits(&self) -> usize {
        match self {
            DataType::BF16 => 16,
            DataType::F16 => 16,
            DataType::F32 => 32,
            DataType::F64 => 64,
            DataType::I8 => 8,
            DataType::U8 => 8,
            DataType::I16 => 16,
            DataType::U16 => 16,
            DataType::I32 => 32,
            DataType::U32 => 32,
            DataType::I64 => 64,
            DataType::U64 => 64,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bits() / 8
    }
}

/// Element types a tensor can be viewed as once its storage lives in the
/// arena.
pub trait ArrayElement: NumCast + Pod {
    fn data_type() -> DataType;
}

macro_rules! impl_array_element {
    ($($ty:ty => $data_type:expr),* $(,)?) => {
        $(
            impl ArrayElement for $ty {
                fn data_type() -> DataType {
                    $data_type
                }
            }
        )*
    };
}

impl_array_element! {
    f16 => DataType::F16,
    bf16 => DataType::BF16,
    f32 => DataType::F32,
    f64 => DataType::F64,
    i8 => DataType::I8,
    u8 => DataType::U8,
    i16 => DataType::I16,
    u16 => DataType::U16,
    i32 => DataType::I32,
    u32 => DataType::U32,
    i64 => DataType::I64,
    u64 => DataType::U64,
}
