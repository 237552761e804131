mod config;
mod error;
mod export;
mod fonts;
mod layout;
mod merge;
mod model;
mod pdf;
mod storage;

pub use config::{Config, DEFAULT_MERGE_KEY, INCH, PageSetup, ReportConfig};
pub use error::Error;
pub use export::{Export, ExportFormat, SHEET_NAME, serialize};
pub use layout::{build_report, column_widths, group_columns, group_rows, plan_slices};
pub use merge::{inner_join, merge_files, read_table};
pub use model::{
    ColumnPlan, Dataset, HeaderMode, PageGeometry, PageSlice, ReportItem, TableFragment,
};
pub use storage::{Folder, Store, timestamp, timestamped_name};

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};

/// Stored copies of the two sources of one request.
#[derive(Debug)]
pub struct Uploads {
    pub users: PathBuf,
    pub details: PathBuf,
}

/// Stored file names, as shown to a user browsing past work.
#[derive(Debug)]
pub struct Listing {
    pub uploaded: Vec<String>,
    pub merged: Vec<String>,
}

/// Merge-and-export pipeline bound to one configuration.
pub struct Pipeline {
    config: Config,
    store: Store,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, Error> {
        let store = Store::open(&config.uploads_dir, &config.merged_dir)?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn upload(&self, users: &Path, details: &Path) -> Result<Uploads, Error> {
        Ok(Uploads {
            users: self.store.store_upload(users)?,
            details: self.store.store_upload(details)?,
        })
    }

    pub fn merge(&self, users: &Path, details: &Path) -> Result<Dataset, Error> {
        let t0 = Instant::now();
        let merged = merge_files(users, details, &self.config.merge_key)?;
        log::info!(
            "Timing: merge={:.1}ms ({} rows, {} columns)",
            t0.elapsed().as_secs_f64() * 1000.0,
            merged.row_count(),
            merged.column_count(),
        );
        Ok(merged)
    }

    pub fn export(&self, dataset: &Dataset, format: ExportFormat) -> Result<Export, Error> {
        self.export_dated(dataset, format, Local::now().date_naive())
    }

    /// Serialize, then publish. Nothing reaches the output store unless
    /// serialization finished.
    pub fn export_dated(
        &self,
        dataset: &Dataset,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<Export, Error> {
        let t0 = Instant::now();

        let bytes = match serialize(dataset, format, &self.config.report, date) {
            Ok(bytes) => bytes,
            Err(e @ Error::EmptyResult) => {
                log::info!("{} export skipped: {e}", format.extension());
                return Err(e);
            }
            Err(e) => {
                log::error!("{} export failed: {e}", format.extension());
                return Err(e);
            }
        };
        let t_render = t0.elapsed();

        let path = self.store.publish(&bytes, format.extension())?;
        let t_total = t0.elapsed();

        log::info!(
            "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
            t_render.as_secs_f64() * 1000.0,
            (t_total - t_render).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            bytes.len(),
        );

        Ok(Export {
            format,
            path,
            download_name: format.download_name(),
            content_type: format.mime_type(),
            bytes,
        })
    }

    /// Store both sources, merge them, and export the result.
    pub fn upload_and_export(
        &self,
        users: &Path,
        details: &Path,
        format: ExportFormat,
    ) -> Result<Export, Error> {
        let uploads = self.upload(users, details)?;
        let merged = self.merge(&uploads.users, &uploads.details)?;
        self.export(&merged, format)
    }

    pub fn fetch(&self, folder: &str, filename: &str) -> Result<PathBuf, Error> {
        self.store.fetch(folder, filename)
    }

    pub fn list(&self) -> Result<Listing, Error> {
        Ok(Listing {
            uploaded: self.store.list(Folder::Uploads)?,
            merged: self.store.list(Folder::Merged)?,
        })
    }
}
