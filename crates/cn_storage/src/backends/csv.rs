use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use async_trait::async_trait;
use cn_core::{Dataset, DatasetSink, Error, NormalizedArticle, Result};

/// Header row, in the field order of `NormalizedArticle`.
pub const COLUMNS: [&str; 18] = [
    "id",
    "guid",
    "title",
    "subtitle",
    "content",
    "published_date",
    "published_timestamp",
    "url",
    "image_url",
    "authors",
    "source_id",
    "keywords",
    "language",
    "upvotes",
    "downvotes",
    "score",
    "sentiment",
    "status",
];

#[derive(Debug, Clone, Default)]
pub struct CsvStorage;

impl CsvStorage {
    pub fn new() -> Self {
        Self
    }

    /// Writes the header and one row per article. The header is written even
    /// for an empty dataset.
    pub fn write<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(COLUMNS)?;
        for article in dataset.articles() {
            writer.serialize(article)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read<R: Read>(reader: R) -> Result<Dataset> {
        let mut reader = ::csv::Reader::from_reader(reader);
        let articles = reader
            .deserialize::<NormalizedArticle>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Dataset::new(articles))
    }

    pub fn load(location: impl AsRef<Path>) -> Result<Dataset> {
        let location = location.as_ref();
        let dataset = Self::read(File::open(location)?)?;
        tracing::info!("📂 Loaded {} articles from {}", dataset.len(), location.display());
        Ok(dataset)
    }
}

#[async_trait]
impl DatasetSink for CsvStorage {
    async fn save(&self, dataset: &Dataset, location: &str) -> Result<()> {
        if location.trim().is_empty() {
            return Err(Error::Storage("dataset location is empty".to_string()));
        }
        let path = Path::new(location);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::write(dataset, File::create(path)?)?;
        tracing::info!("💾 Dataset saved to {}", location);
        Ok(())
    }
}
