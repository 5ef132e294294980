pub mod address;
pub mod record;
pub mod source;
pub mod stats;

pub use address::*;
pub use record::*;
pub use source::*;
pub use stats::*;
