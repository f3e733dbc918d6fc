pub mod case;
pub mod meta;

pub use case::*;
pub use meta::*;
