pub mod analyzers;
pub mod cleaner;
pub mod error;
pub mod features;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod sink;

pub use error::{EtlError, Result};
