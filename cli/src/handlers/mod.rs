mod encode;
mod inspect;

pub use encode::handle_encode_hparams;
pub use inspect::handle_inspect;
