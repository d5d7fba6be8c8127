pub mod counter;
pub mod trade;

pub use counter::*;
pub use trade::*;
