use std::path::PathBuf;

use crate::error::Error;
use crate::model::{HeaderMode, PageGeometry};

pub const INCH: f32 = 72.0;

pub const DEFAULT_MERGE_KEY: &str = "user_id";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageSetup {
    /// US Letter turned sideways, half-inch margins.
    pub fn landscape_letter() -> Self {
        Self {
            width: 11.0 * INCH,
            height: 8.5 * INCH,
            margin_left: 0.5 * INCH,
            margin_right: 0.5 * INCH,
            margin_top: 0.5 * INCH,
            margin_bottom: 0.5 * INCH,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::landscape_letter()
    }
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub page: PageSetup,
    pub max_rows_per_page: usize,
    pub min_col_width: f32,
    pub max_col_width: f32,
    /// Width granted per character of the longest value in a column.
    pub width_per_char: f32,
    pub header_mode: HeaderMode,
    pub title: String,
    pub footer_info: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            max_rows_per_page: 10,
            min_col_width: 1.0 * INCH,
            max_col_width: 2.0 * INCH,
            width_per_char: 0.1 * INCH,
            header_mode: HeaderMode::default(),
            title: "Merged Data Report".into(),
            footer_info: "[Your information here]".into(),
        }
    }
}

impl ReportConfig {
    pub fn geometry(&self) -> Result<PageGeometry, Error> {
        let usable_width = self.page.usable_width();
        if !(usable_width.is_finite() && usable_width > 0.0) {
            return Err(Error::Layout(format!(
                "usable width {usable_width:.1}pt leaves no room for a table"
            )));
        }
        if self.page.usable_height() <= 0.0 {
            return Err(Error::Layout(format!(
                "usable height {:.1}pt leaves no room for a table",
                self.page.usable_height()
            )));
        }
        if self.max_rows_per_page == 0 {
            return Err(Error::Layout("max rows per page must be at least 1".into()));
        }
        if !(self.min_col_width > 0.0 && self.min_col_width <= self.max_col_width) {
            return Err(Error::Layout(format!(
                "column width bounds [{:.1}, {:.1}] are invalid",
                self.min_col_width, self.max_col_width
            )));
        }
        Ok(PageGeometry {
            usable_width,
            max_rows_per_page: self.max_rows_per_page,
        })
    }
}

/// Everything an export pipeline needs, passed in at construction.
#[derive(Clone, Debug)]
pub struct Config {
    pub uploads_dir: PathBuf,
    pub merged_dir: PathBuf,
    pub merge_key: String,
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            merged_dir: PathBuf::from("merged"),
            merge_key: DEFAULT_MERGE_KEY.into(),
            report: ReportConfig::default(),
        }
    }
}
