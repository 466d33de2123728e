mod assignment;
mod primitives;

pub use assignment::*;
pub use primitives::*;
