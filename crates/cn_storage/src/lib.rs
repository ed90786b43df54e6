use std::sync::Arc;

use cn_core::{DatasetSink, Error, Result};

pub mod backends;

pub use backends::*;

/// Builds the sink registered under `kind` ("csv" or "memory").
pub fn create_sink(kind: &str) -> Result<Arc<dyn DatasetSink>> {
    match kind {
        "csv" => Ok(Arc::new(CsvStorage::new())),
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_sink;
}
