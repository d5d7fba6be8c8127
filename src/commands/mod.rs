pub mod sets;
pub mod stats;
pub mod trades;

pub use sets::*;
pub use stats::*;
pub use trades::*;
