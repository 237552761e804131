use std::path::PathBuf;

use chrono::NaiveDate;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook, XlsxError};

use crate::config::ReportConfig;
use crate::error::Error;
use crate::layout::build_report;
use crate::model::Dataset;
use crate::pdf;

pub const SHEET_NAME: &str = "MergedData";

// Stamped into docProps/core.xml in place of the wall clock so identical
// data always yields identical workbook bytes.
const XLSX_CREATED: (u16, u8, u8) = (2000, 1, 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Fixed name the download copy is offered under.
    pub fn download_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "merged_data.csv",
            ExportFormat::Xlsx => "merged_data.xlsx",
            ExportFormat::Pdf => "merged_data.pdf",
        }
    }
}

/// A finished export: the persisted file plus the in-memory copy handed
/// back to the caller.
#[derive(Debug)]
pub struct Export {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub download_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

pub fn to_xlsx(dataset: &Dataset) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (ci, name) in dataset.columns().iter().enumerate() {
        let col = u16::try_from(ci).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string(0, col, name)?;
    }
    for (ri, row) in dataset.rows().iter().enumerate() {
        let xrow = u32::try_from(ri + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (ci, value) in row.iter().enumerate() {
            let col = u16::try_from(ci).map_err(|_| XlsxError::RowColumnLimitError)?;
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) if n.is_finite() => worksheet.write_number(xrow, col, n)?,
                _ => worksheet.write_string(xrow, col, value)?,
            };
        }
    }

    let (year, month, day) = XLSX_CREATED;
    let created = ExcelDateTime::from_ymd(year, month, day)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    Ok(workbook.save_to_buffer()?)
}

pub fn to_pdf(dataset: &Dataset, config: &ReportConfig, date: NaiveDate) -> Result<Vec<u8>, Error> {
    let items = build_report(dataset, config, date)?;
    pdf::render(&items, &config.page)
}

/// Serialize `dataset` in `format`. `date` is the footer date of a PDF report.
pub fn serialize(
    dataset: &Dataset,
    format: ExportFormat,
    config: &ReportConfig,
    date: NaiveDate,
) -> Result<Vec<u8>, Error> {
    match format {
        ExportFormat::Csv => to_csv(dataset),
        ExportFormat::Xlsx => to_xlsx(dataset),
        ExportFormat::Pdf => to_pdf(dataset, config, date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["user_id".into(), "name".into()],
            vec![
                vec!["1".into(), "Ann, Jr.".into()],
                vec!["2".into(), "Bob".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_has_header_and_quotes_when_needed() {
        let bytes = to_csv(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "user_id,name\n1,\"Ann, Jr.\"\n2,Bob\n"
        );
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&sample()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(ExportFormat::Xlsx.download_name(), "merged_data.xlsx");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn empty_dataset_pdf_is_empty_result() {
        let empty = Dataset::new(vec!["user_id".into()], vec![]).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            to_pdf(&empty, &ReportConfig::default(), date),
            Err(Error::EmptyResult)
        ));
        // Tabular formats still produce a header-only file.
        assert_eq!(to_csv(&empty).unwrap(), b"user_id\n");
    }
}
