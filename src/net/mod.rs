pub mod address;
pub mod poolable;

pub use address::*;
pub use poolable::*;
