use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::Error;
use crate::model::Dataset;

/// Read a tabular source. `.csv` goes through the csv reader; workbook
/// extensions read the first worksheet. The first row is the header.
pub fn read_table(path: &Path) -> Result<Dataset, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let dataset = match ext.as_str() {
        "csv" | "txt" => read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_sheet(path)?,
        _ => {
            return Err(Error::Merge(format!(
                "{}: unsupported file type (expected .csv or a spreadsheet)",
                path.display()
            )));
        }
    };
    log::debug!(
        "read {}: {} columns, {} rows",
        path.display(),
        dataset.column_count(),
        dataset.row_count()
    );
    Ok(dataset)
}

fn read_csv(path: &Path) -> Result<Dataset, Error> {
    let fail = |e: csv::Error| Error::Merge(format!("{}: {e}", path.display()));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(fail)?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(fail)?
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect::<Vec<_>>())
                .map_err(fail)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Dataset::new(columns, rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn read_sheet(path: &Path) -> Result<Dataset, Error> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Merge(format!("{}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Merge(format!("{}: workbook contains no sheets", path.display())))?
        .map_err(|e| Error::Merge(format!("{}: {e}", path.display())))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(Error::Merge(format!("{}: sheet has no header row", path.display())));
    };
    let columns: Vec<String> = header.iter().map(cell_text).collect();
    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Dataset::new(columns, rows)
}

/// Keys compare as text, except that integer-looking keys compare by
/// value so `"007"` in one file matches `7` in another.
fn normalize_key(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(n) => Cow::Owned(n.to_string()),
        Err(_) => match trimmed.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Cow::Owned((f as i64).to_string())
            }
            _ => Cow::Borrowed(trimmed),
        },
    }
}

/// Relational inner join on `key`.
///
/// Output rows follow left order; each left row pairs with every matching
/// right row in right order. Rows whose key has no partner on the other
/// side are dropped. Output columns are the left columns followed by the
/// right columns without the key. Non-key names present on both sides are
/// suffixed `_x` (left) and `_y` (right).
pub fn inner_join(left: &Dataset, right: &Dataset, key: &str) -> Result<Dataset, Error> {
    let lk = left
        .column_index(key)
        .ok_or_else(|| Error::Merge(format!("first file has no `{key}` column")))?;
    let rk = right
        .column_index(key)
        .ok_or_else(|| Error::Merge(format!("second file has no `{key}` column")))?;

    let right_keep: Vec<usize> = (0..right.column_count()).filter(|&i| i != rk).collect();
    let left_names: HashSet<&str> = left
        .columns()
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != lk)
        .map(|(_, c)| c.as_str())
        .collect();
    let right_names: HashSet<&str> = right_keep
        .iter()
        .map(|&i| right.columns()[i].as_str())
        .collect();

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i != lk && right_names.contains(c.as_str()) {
                format!("{c}_x")
            } else {
                c.clone()
            }
        })
        .collect();
    columns.extend(right_keep.iter().map(|&i| {
        let c = &right.columns()[i];
        if left_names.contains(c.as_str()) {
            format!("{c}_y")
        } else {
            c.clone()
        }
    }));

    let mut index: HashMap<Cow<'_, str>, Vec<usize>> = HashMap::new();
    for (ri, row) in right.rows().iter().enumerate() {
        index.entry(normalize_key(&row[rk])).or_default().push(ri);
    }

    let mut rows = Vec::new();
    for row in left.rows() {
        let Some(matches) = index.get(&normalize_key(&row[lk])) else {
            continue;
        };
        for &ri in matches {
            let partner = &right.rows()[ri];
            let mut merged = row.clone();
            merged.extend(right_keep.iter().map(|&i| partner[i].clone()));
            rows.push(merged);
        }
    }

    log::info!(
        "inner join on `{key}`: {} x {} rows -> {} rows, {} columns",
        left.row_count(),
        right.row_count(),
        rows.len(),
        columns.len()
    );

    Dataset::new(columns, rows)
}

/// Read both sources and join them on `key`.
pub fn merge_files(users: &Path, details: &Path, key: &str) -> Result<Dataset, Error> {
    let left = read_table(users)?;
    let right = read_table(details)?;
    inner_join(&left, &right, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn drops_unmatched_rows_on_both_sides() {
        let users = ds(&["user_id", "name"], &[&["1", "Ann"], &["2", "Bob"], &["3", "Cy"]]);
        let details = ds(&["user_id", "city"], &[&["3", "Oslo"], &["1", "Rome"], &["9", "Nice"]]);
        let merged = inner_join(&users, &details, "user_id").unwrap();

        assert_eq!(merged.columns(), ["user_id", "name", "city"]);
        assert_eq!(
            merged.rows(),
            [
                vec!["1".to_string(), "Ann".into(), "Rome".into()],
                vec!["3".to_string(), "Cy".into(), "Oslo".into()],
            ]
        );
    }

    #[test]
    fn duplicate_keys_multiply_in_right_order() {
        let users = ds(&["user_id", "name"], &[&["1", "Ann"]]);
        let details = ds(&["user_id", "order"], &[&["1", "a"], &["2", "b"], &["1", "c"]]);
        let merged = inner_join(&users, &details, "user_id").unwrap();
        let orders: Vec<&str> = merged.rows().iter().map(|r| r[2].as_str()).collect();
        assert_eq!(orders, ["a", "c"]);
    }

    #[test]
    fn overlapping_columns_get_suffixes() {
        let users = ds(&["name", "user_id"], &[&["Ann", "1"]]);
        let details = ds(&["user_id", "name", "age"], &[&["1", "Annie", "30"]]);
        let merged = inner_join(&users, &details, "user_id").unwrap();
        assert_eq!(merged.columns(), ["name_x", "user_id", "name_y", "age"]);
        assert_eq!(merged.rows()[0], ["Ann", "1", "Annie", "30"]);
    }

    #[test]
    fn integer_keys_match_across_formatting() {
        let users = ds(&["user_id"], &[&["007"], &[" 8"]]);
        let details = ds(&["user_id", "v"], &[&["7", "x"], &["8.0", "y"]]);
        let merged = inner_join(&users, &details, "user_id").unwrap();
        assert_eq!(merged.row_count(), 2);
    }

    #[test]
    fn missing_key_is_merge_error() {
        let users = ds(&["id"], &[&["1"]]);
        let details = ds(&["user_id"], &[&["1"]]);
        assert!(matches!(
            inner_join(&users, &details, "user_id"),
            Err(Error::Merge(msg)) if msg.contains("first file")
        ));
        assert!(matches!(
            inner_join(&details, &users, "user_id"),
            Err(Error::Merge(msg)) if msg.contains("second file")
        ));
    }
}
