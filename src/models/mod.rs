pub mod audit;
pub mod document;
pub mod enums;
pub mod filters;
pub mod finding;
pub mod job;

pub use audit::*;
pub use document::*;
pub use enums::*;
pub use filters::*;
pub use finding::*;
pub use job::*;
