pub mod environmental;
pub mod recommendation;

pub use environmental::*;
pub use recommendation::*;
