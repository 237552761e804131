#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use merge_report::{Config, Pipeline};
use tempfile::TempDir;

/// Scratch area holding the input files plus the pipeline's two stores.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let _ = env_logger::try_init();
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn config(&self) -> Config {
        Config {
            uploads_dir: self.path("uploads"),
            merged_dir: self.path("merged"),
            ..Config::default()
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config()).expect("open pipeline")
    }

    /// Files currently published in the merged store.
    pub fn merged_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path("merged"))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub const USERS_CSV: &str = "\
user_id,name,email
1,Ann Archer,ann@example.com
2,Bob Baker,bob@example.com
3,Cy Cooper,cy@example.com
4,Di Dunn,di@example.com
";

pub const DETAILS_CSV: &str = "\
user_id,city,plan
4,Oslo,pro
1,Rome,free
9,Nice,pro
3,Kyiv,team
";

/// `rows` users with `extra_cols` additional wide columns, keyed 1..=rows.
pub fn wide_csv(rows: usize, extra_cols: usize) -> (String, String) {
    let mut users = String::from("user_id,name");
    let mut details = String::from("user_id");
    for c in 0..extra_cols {
        details.push_str(&format!(",attribute_number_{c:02}"));
    }
    users.push('\n');
    details.push('\n');
    for r in 1..=rows {
        users.push_str(&format!("{r},user {r}\n"));
        details.push_str(&r.to_string());
        for c in 0..extra_cols {
            details.push_str(&format!(",value {r}-{c}"));
        }
        details.push('\n');
    }
    (users, details)
}

/// Number of page objects in a PDF produced by the report renderer.
pub fn pdf_page_count(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}

pub fn file_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).expect("read file")
}
