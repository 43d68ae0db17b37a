//! Data providers for the raw case tables.
//!
//! A source never caches: every [`CaseSource::load_model`] call fetches and
//! parses the three tables again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
use url::Url;

use super::model::CaseModel;
use super::parser::parse_case_table;
use super::types::{CaseKind, CaseTable, RawDataset};
use crate::config::{Config, SourceKind};
use crate::error::{AppError, SourceError};
use crate::metrics;

/// Provider of [`RawDataset`]s.
#[derive(Debug, Clone)]
pub enum CaseSource {
    /// Download the CSV files over HTTP.
    Remote(RemoteSource),
    /// Read the CSV files from a local directory.
    Directory(DirectorySource),
    /// Serve an in-memory dataset.
    Static(StaticSource),
}

impl CaseSource {
    /// Build the source selected by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match config.data_source {
            SourceKind::Remote => Ok(CaseSource::Remote(RemoteSource::new(
                &config.data_base_url,
                Duration::from_millis(config.http_timeout_ms),
            )?)),
            SourceKind::Directory => {
                let dir = config.data_dir.as_deref().ok_or_else(|| {
                    AppError::InvalidConfig("DATA_DIR is required for the directory source".into())
                })?;
                Ok(CaseSource::Directory(DirectorySource::new(dir)))
            }
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            CaseSource::Remote(s) => format!("remote {}", s.base_url),
            CaseSource::Directory(s) => format!("directory {}", s.dir.display()),
            CaseSource::Static(_) => "static".to_string(),
        }
    }

    /// Fetch all three tables.
    pub async fn fetch(&self) -> Result<RawDataset, SourceError> {
        match self {
            CaseSource::Remote(s) => s.fetch().await,
            CaseSource::Directory(s) => s.fetch().await,
            CaseSource::Static(s) => s.fetch(),
        }
    }

    /// Fetch the tables and build a fresh model.
    pub async fn load_model(&self) -> Result<CaseModel, SourceError> {
        let _timer = metrics::timer_snapshot_build();
        let raw = self.fetch().await?;
        CaseModel::new(raw).map_err(|source| SourceError::Parse {
            file: CaseKind::Confirmed.file_name(),
            source,
        })
    }
}

fn parse_named(kind: CaseKind, body: &str) -> Result<CaseTable, SourceError> {
    parse_case_table(body).map_err(|source| SourceError::Parse {
        file: kind.file_name(),
        source,
    })
}

/// Downloads `time_series_covid19_<kind>_global.csv` relative to a base URL.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    http: reqwest::Client,
    base_url: Url,
}

impl RemoteSource {
    /// Create a remote source. `base_url` should end with `/` so that file
    /// names join beneath it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url =
            Url::parse(base_url).map_err(|e| AppError::InvalidConfig(format!("DATA_BASE_URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { http, base_url })
    }

    /// URL of the file for a case kind.
    pub fn url_for(&self, kind: CaseKind) -> Result<Url, SourceError> {
        Ok(self.base_url.join(&kind.file_name())?)
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch(&self) -> Result<RawDataset, SourceError> {
        let (confirmed, deaths, recovered) = tokio::try_join!(
            self.fetch_table(CaseKind::Confirmed),
            self.fetch_table(CaseKind::Deaths),
            self.fetch_table(CaseKind::Recovered),
        )?;
        Ok(RawDataset {
            confirmed,
            deaths,
            recovered,
        })
    }

    async fn fetch_table(&self, kind: CaseKind) -> Result<CaseTable, SourceError> {
        let url = self.url_for(kind)?;
        debug!(url = %url, "Fetching case table");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_named(kind, &body)
    }
}

/// Reads the CSV files from a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Create a directory source.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn fetch(&self) -> Result<RawDataset, SourceError> {
        let (confirmed, deaths, recovered) = tokio::try_join!(
            self.read_table(CaseKind::Confirmed),
            self.read_table(CaseKind::Deaths),
            self.read_table(CaseKind::Recovered),
        )?;
        Ok(RawDataset {
            confirmed,
            deaths,
            recovered,
        })
    }

    async fn read_table(&self, kind: CaseKind) -> Result<CaseTable, SourceError> {
        let path = self.dir.join(kind.file_name());
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
        parse_named(kind, &body)
    }
}

/// Serves a fixed in-memory dataset, optionally failing every fetch.
#[derive(Debug, Clone)]
pub struct StaticSource {
    dataset: Arc<RawDataset>,
    failure: Option<String>,
}

impl StaticSource {
    /// Serve `dataset` on every fetch.
    pub fn new(dataset: RawDataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            failure: None,
        }
    }

    /// A source whose every fetch fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            dataset: Arc::new(RawDataset::default()),
            failure: Some(reason.into()),
        }
    }

    fn fetch(&self) -> Result<RawDataset, SourceError> {
        if let Some(reason) = &self.failure {
            return Err(SourceError::Injected(reason.clone()));
        }
        Ok(RawDataset::clone(&self.dataset))
    }
}

/// Builder for in-memory datasets.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    dataset: RawDataset,
}

impl DatasetBuilder {
    /// Start a dataset with the given date headers for every table.
    pub fn new<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dates: Vec<String> = dates.into_iter().map(Into::into).collect();
        let mut dataset = RawDataset::default();
        for kind in CaseKind::all() {
            dataset.table_mut(kind).dates = dates.clone();
        }
        Self { dataset }
    }

    /// Add (or sum into) a country's series for one kind.
    pub fn series(mut self, kind: CaseKind, country: &str, values: &[u64]) -> Self {
        let table = self.dataset.table_mut(kind);
        let width = table.dates.len();
        let series = table
            .series
            .entry(country.to_string())
            .or_insert_with(|| vec![0; width]);
        for (slot, value) in series.iter_mut().zip(values) {
            *slot += value;
        }
        self
    }

    /// Finish the dataset.
    pub fn build(self) -> RawDataset {
        self.dataset
    }
}

/// Small three-day dataset used by tests and the `snapshot --demo` command.
pub fn sample_dataset() -> RawDataset {
    use CaseKind::{Confirmed, Deaths, Recovered};

    let dataset = DatasetBuilder::new(["1/22/20", "1/23/20", "1/24/20"])
        .series(Confirmed, "Canada", &[1, 2, 4])
        .series(Confirmed, "Germany", &[4, 8, 16])
        .series(Confirmed, "South Sudan", &[0, 0, 1])
        .series(Confirmed, "Sudan", &[0, 1, 2])
        .series(Confirmed, "US", &[10, 20, 40])
        .series(Confirmed, "United Kingdom", &[2, 3, 5])
        .series(Deaths, "Canada", &[0, 0, 0])
        .series(Deaths, "Germany", &[0, 0, 1])
        .series(Deaths, "South Sudan", &[0, 0, 0])
        .series(Deaths, "Sudan", &[0, 0, 0])
        .series(Deaths, "US", &[1, 2, 3])
        .series(Deaths, "United Kingdom", &[0, 0, 0])
        .series(Recovered, "Germany", &[2, 6, 12])
        .series(Recovered, "South Sudan", &[0, 0, 0])
        .series(Recovered, "Sudan", &[0, 0, 1])
        .series(Recovered, "US", &[0, 5, 10])
        .series(Recovered, "United Kingdom", &[0, 1, 2])
        .build();

    info!(countries = dataset.confirmed.series.len(), "Built sample dataset");
    dataset
}
