pub mod cache;
pub mod config;
pub mod executor;
pub mod registry;
pub mod request;
pub mod retry;
pub mod social;
pub mod state;
pub mod util;

pub use cache::*;
pub use config::*;
pub use executor::*;
pub use registry::*;
pub use request::*;
pub use retry::*;
pub use social::*;
pub use state::*;
pub use util::*;
