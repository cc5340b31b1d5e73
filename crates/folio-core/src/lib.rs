pub mod backoff;
pub mod error;
pub mod ids;
pub mod model;
pub mod outcomes;
pub mod snapshot;
pub mod transition;
pub mod types;

pub use backoff::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use outcomes::*;
pub use snapshot::*;
pub use transition::*;
pub use types::*;
