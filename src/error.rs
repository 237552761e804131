use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Either source could not be read, parsed, or joined on the merge key.
    #[error("merge failed: {0}")]
    Merge(String),

    /// The merged dataset has no rows or no columns.
    #[error("merged dataset is empty, nothing to render")]
    EmptyResult,

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("{folder}/{filename} does not exist")]
    NotFound { folder: String, filename: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    pub(crate) fn not_found(folder: impl Into<String>, filename: impl Into<String>) -> Self {
        Error::NotFound {
            folder: folder.into(),
            filename: filename.into(),
        }
    }
}
