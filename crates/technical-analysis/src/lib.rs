pub mod indicators;
pub mod pipeline;
pub mod snapshot;


pub use indicators::*;
pub use pipeline::*;
pub use snapshot::*;
