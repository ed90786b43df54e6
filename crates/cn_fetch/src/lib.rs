pub mod assembler;
pub mod engine;
pub mod logging;
pub mod sources;

pub use assembler::DatasetAssembler;
pub use engine::{FetchConfig, FetchReport, FetchWindow, PaginatedFetcher, StopReason};
pub use logging::{init_logging, Logger};
pub use sources::{create_source, CoinDeskConfig, CoinDeskSource};

pub mod prelude {
    pub use super::{DatasetAssembler, FetchConfig, PaginatedFetcher};
    pub use cn_core::{ArticleSource, Dataset, Error, RawArticle, Result};
}
