use std::sync::Arc;

use cn_core::{ArticleSource, Result};

pub mod coindesk;

pub use coindesk::{CoinDeskConfig, CoinDeskSource};

/// Builds the article source registered under `name`.
pub fn create_source(name: &str, api_key: &str) -> Result<Arc<dyn ArticleSource>> {
    match name {
        "coindesk" => Ok(Arc::new(CoinDeskSource::new(CoinDeskConfig::new(api_key))?)),
        other => Err(cn_core::Error::Config(format!("Unknown article source: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_source() {
        let source = create_source("coindesk", "key").unwrap();
        assert_eq!(source.name(), "CoinDesk");
        assert!(create_source("cryptopanic", "key").is_err());
    }
}
