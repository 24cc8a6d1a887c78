pub mod cli;
pub mod config;
pub mod error;
pub mod prism;
pub mod step;
pub mod telemetry;

pub mod prelude {
    pub use crate::error::{Error, PrismError, Result};

    pub use crate::prism::Prism;
    pub use crate::prism::client::PrismClient;
}
