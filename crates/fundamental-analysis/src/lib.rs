pub mod dcf;
pub mod growth;
pub mod peers;

pub use dcf::*;
pub use growth::*;
pub use peers::*;
