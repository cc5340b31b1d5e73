pub mod memory;
pub mod query;
pub mod subscription;
pub mod traits;

pub use memory::*;
pub use query::*;
pub use subscription::*;
pub use traits::*;
