use std::ops::Range;

use chrono::NaiveDate;

use crate::config::ReportConfig;
use crate::error::Error;
use crate::model::{
    ColumnPlan, Dataset, HeaderMode, PageGeometry, PageSlice, ReportItem, TableFragment,
};

const TITLE_SPACE_AFTER: f32 = 12.0;
const FOOTER_SPACE_BEFORE: f32 = 24.0;

/// One width per column: the longest value (header included) times the
/// per-character width, held within the configured bounds.
pub fn column_widths(dataset: &Dataset, config: &ReportConfig) -> Vec<f32> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(ci, name)| {
            let max_len = dataset
                .rows()
                .iter()
                .map(|row| row[ci].chars().count())
                .fold(name.chars().count(), usize::max);
            (max_len as f32 * config.width_per_char)
                .min(config.max_col_width)
                .max(config.min_col_width)
        })
        .collect()
}

/// Greedy left-to-right grouping. A column joins the current group unless
/// the running sum would then be strictly greater than `usable_width`.
/// A column wider than the page still gets a group of its own.
pub fn group_columns(widths: &[f32], usable_width: f32) -> ColumnPlan {
    let mut groups = Vec::new();
    let mut start = 0usize;
    let mut running = 0.0f32;

    for (i, &w) in widths.iter().enumerate() {
        if i > start && running + w > usable_width {
            groups.push(start..i);
            start = i;
            running = 0.0;
        }
        running += w;
    }
    if start < widths.len() {
        groups.push(start..widths.len());
    }

    ColumnPlan { groups }
}

/// Chunks of `per_page` rows, the last one holding the remainder. The
/// nominal page count is `total / per_page + 1`; the trailing chunk that
/// produces on exact multiples is empty and dropped.
pub fn group_rows(total: usize, per_page: usize) -> Result<Vec<Range<usize>>, Error> {
    if per_page == 0 {
        return Err(Error::Layout("max rows per page must be at least 1".into()));
    }
    let pages = total / per_page + 1;
    Ok((0..pages)
        .map(|p| {
            let start = p * per_page;
            start..(start + per_page).min(total)
        })
        .filter(|r| !r.is_empty())
        .collect())
}

/// Every non-empty (row group, column group) intersection, row-group-major.
pub fn plan_slices(
    dataset: &Dataset,
    widths: &[f32],
    geometry: &PageGeometry,
    header_mode: HeaderMode,
) -> Result<Vec<PageSlice>, Error> {
    let columns = group_columns(widths, geometry.usable_width);

    let row_groups: Vec<(bool, Range<usize>)> = match header_mode {
        HeaderMode::Repeat => group_rows(dataset.row_count(), geometry.max_rows_per_page)?
            .into_iter()
            .map(|r| (true, r))
            .collect(),
        // Matrix row 0 is the header, matrix row i is data row i - 1.
        HeaderMode::FirstPage => {
            group_rows(dataset.row_count() + 1, geometry.max_rows_per_page)?
                .into_iter()
                .map(|m| (m.start == 0, m.start.saturating_sub(1)..m.end - 1))
                .collect()
        }
    };

    let mut slices = Vec::with_capacity(row_groups.len() * columns.len());
    for (header, rows) in &row_groups {
        for cols in &columns.groups {
            let slice = PageSlice {
                header: *header,
                rows: rows.clone(),
                cols: cols.clone(),
            };
            if slice.is_empty() {
                log::debug!("skipping empty slice rows={:?} cols={:?}", slice.rows, slice.cols);
                continue;
            }
            slices.push(slice);
        }
    }

    log::debug!(
        "plan: {} row groups x {} column groups (sizes {:?}) -> {} slices",
        row_groups.len(),
        columns.len(),
        columns.sizes(),
        slices.len()
    );

    Ok(slices)
}

/// The full render instruction stream: title, one table fragment per slice
/// separated by page breaks, then the dated footer.
pub fn build_report(
    dataset: &Dataset,
    config: &ReportConfig,
    date: NaiveDate,
) -> Result<Vec<ReportItem>, Error> {
    if dataset.is_empty() {
        return Err(Error::EmptyResult);
    }
    let geometry = config.geometry()?;

    let widths = column_widths(dataset, config);
    if widths.is_empty() {
        return Err(Error::Layout("no column widths could be computed".into()));
    }
    log::debug!("column widths: {widths:?}");

    let slices = plan_slices(dataset, &widths, &geometry, config.header_mode)?;

    let mut items = Vec::with_capacity(slices.len() * 2 + 4);
    items.push(ReportItem::Title(config.title.clone()));
    items.push(ReportItem::Spacer(TITLE_SPACE_AFTER));

    let last = slices.len().saturating_sub(1);
    for (i, slice) in slices.iter().enumerate() {
        log::debug!(
            "SLICE {} header={} rows={:?} cols={:?}",
            i,
            slice.header,
            slice.rows,
            slice.cols
        );
        items.push(ReportItem::Table(TableFragment {
            cells: slice.cells(dataset),
            col_widths: widths[slice.cols.clone()].to_vec(),
            header_row: slice.header,
        }));
        if i < last {
            items.push(ReportItem::PageBreak);
        }
    }

    items.push(ReportItem::Spacer(FOOTER_SPACE_BEFORE));
    items.push(ReportItem::Footer(format!(
        "Related Information: {}  |  Signature Date: {}",
        config.footer_info,
        date.format("%Y-%m-%d")
    )));

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INCH;

    fn dataset(cols: usize, rows: usize) -> Dataset {
        let columns = (0..cols).map(|c| format!("c{c}")).collect();
        let rows = (0..rows)
            .map(|r| (0..cols).map(|c| format!("r{r}c{c}")).collect())
            .collect();
        Dataset::new(columns, rows).unwrap()
    }

    fn geometry(usable_width: f32, max_rows_per_page: usize) -> PageGeometry {
        PageGeometry {
            usable_width,
            max_rows_per_page,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn widths_follow_longest_value_and_clamp() {
        let ds = Dataset::new(
            vec!["user_id".into(), "bio".into(), "x".into()],
            vec![
                vec!["1".into(), "a".repeat(15), "y".into()],
                vec!["22".into(), "b".repeat(40), "".into()],
            ],
        )
        .unwrap();
        let widths = column_widths(&ds, &ReportConfig::default());
        // 7 chars -> 50.4pt clamps up to 1in; 40 chars -> 288pt clamps down to 2in.
        assert_eq!(widths, vec![72.0, 144.0, 72.0]);

        let ds = Dataset::new(vec!["name".into()], vec![vec!["abcdefghijkl".into()]]).unwrap();
        let widths = column_widths(&ds, &ReportConfig::default());
        assert!((widths[0] - 12.0 * 7.2).abs() < 1e-3);
    }

    #[test]
    fn widths_count_characters_not_bytes() {
        let ds = Dataset::new(vec!["n".into()], vec![vec!["ééééééééééééééé".into()]]).unwrap();
        let widths = column_widths(&ds, &ReportConfig::default());
        assert!((widths[0] - 15.0 * 7.2).abs() < 1e-3);
    }

    #[test]
    fn column_groups_for_worked_example() {
        let widths = [1.0 * INCH, 1.5 * INCH, 0.8 * INCH, 2.0 * INCH];
        let plan = group_columns(&widths, 3.0 * INCH);
        assert_eq!(plan.groups, vec![0..2, 2..4]);
        assert_eq!(plan.sizes(), vec![2, 2]);
    }

    #[test]
    fn exact_fill_stays_in_current_group() {
        let plan = group_columns(&[108.0, 108.0, 1.0], 216.0);
        assert_eq!(plan.sizes(), vec![2, 1]);
    }

    #[test]
    fn oversized_column_is_placed_alone() {
        let plan = group_columns(&[50.0, 400.0, 50.0, 50.0], 300.0);
        assert_eq!(plan.groups, vec![0..1, 1..2, 2..4]);

        let plan = group_columns(&[400.0], 300.0);
        assert_eq!(plan.groups, vec![0..1]);
    }

    #[test]
    fn no_columns_no_groups() {
        assert!(group_columns(&[], 720.0).is_empty());
    }

    #[test]
    fn column_groups_partition_and_fit() {
        let usable = 720.0;
        for n in 1..40usize {
            let widths: Vec<f32> = (0..n)
                .map(|i| [72.0, 144.0, 100.8, 800.0, 129.6][(i * 7 + n) % 5])
                .collect();
            let plan = group_columns(&widths, usable);

            let mut expected_start = 0;
            for g in &plan.groups {
                assert_eq!(g.start, expected_start);
                assert!(!g.is_empty());
                let sum: f32 = widths[g.clone()].iter().sum();
                assert!(sum <= usable || g.len() == 1, "group {g:?} sum {sum}");
                expected_start = g.end;
            }
            assert_eq!(plan.sizes().iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn row_groups_for_25_rows() {
        assert_eq!(group_rows(25, 10).unwrap(), vec![0..10, 10..20, 20..25]);
    }

    #[test]
    fn exact_multiple_drops_trailing_empty_group() {
        assert_eq!(group_rows(20, 10).unwrap(), vec![0..10, 10..20]);
        assert!(group_rows(0, 10).unwrap().is_empty());
    }

    #[test]
    fn row_group_counts() {
        for per_page in 1..12usize {
            for total in 0..60usize {
                let groups = group_rows(total, per_page).unwrap();
                assert_eq!(groups.len(), total.div_ceil(per_page));
                for (i, g) in groups.iter().enumerate() {
                    if i + 1 < groups.len() {
                        assert_eq!(g.len(), per_page);
                    } else {
                        let rem = total % per_page;
                        assert_eq!(g.len(), if rem == 0 { per_page } else { rem });
                    }
                }
            }
        }
    }

    #[test]
    fn zero_rows_per_page_is_a_layout_error() {
        assert!(matches!(group_rows(5, 0), Err(Error::Layout(_))));
    }

    #[test]
    fn repeat_mode_slices_reconstruct_dataset() {
        let ds = dataset(13, 27);
        let widths = vec![100.0; 13];
        let slices = plan_slices(&ds, &widths, &geometry(720.0, 10), HeaderMode::Repeat).unwrap();

        // 3 row groups x 2 column groups (7 + 6 columns).
        assert_eq!(slices.len(), 6);
        assert!(slices.iter().all(|s| s.header));

        let mut rebuilt = vec![Vec::new(); ds.row_count()];
        for s in &slices {
            let cells = s.cells(&ds);
            assert_eq!(cells[0], ds.columns()[s.cols.clone()].to_vec());
            for (ri, row) in s.rows.clone().zip(cells.into_iter().skip(1)) {
                rebuilt[ri].extend(row);
            }
        }
        assert_eq!(rebuilt, ds.rows().to_vec());
    }

    #[test]
    fn first_page_mode_slices_reconstruct_matrix() {
        let ds = dataset(4, 19);
        let widths = vec![300.0; 4];
        let slices =
            plan_slices(&ds, &widths, &geometry(720.0, 10), HeaderMode::FirstPage).unwrap();

        // 20 matrix rows -> 2 row groups, 2 column groups each.
        assert_eq!(slices.len(), 4);
        assert_eq!(
            slices.iter().map(|s| s.header).collect::<Vec<_>>(),
            vec![true, true, false, false]
        );
        assert_eq!(slices[0].rows, 0..9);
        assert_eq!(slices[2].rows, 9..19);

        let mut matrix = vec![Vec::new(); ds.row_count() + 1];
        let mut next_row = [0usize; 2];
        for s in &slices {
            let group = usize::from(!s.header);
            let first = if s.header { 0 } else { s.rows.start + 1 };
            for (i, row) in s.cells(&ds).into_iter().enumerate() {
                matrix[first + i].extend(row);
            }
            next_row[group] = first + s.row_count();
        }
        assert_eq!(next_row, [10, 20]);

        let mut expected = vec![ds.columns().to_vec()];
        expected.extend(ds.rows().iter().cloned());
        assert_eq!(matrix, expected);
    }

    #[test]
    fn first_page_mode_exact_multiple_has_no_empty_slice() {
        // 9 data rows + header = 10 matrix rows = exactly one page.
        let ds = dataset(2, 9);
        let slices =
            plan_slices(&ds, &[72.0, 72.0], &geometry(720.0, 10), HeaderMode::FirstPage).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].row_count(), 10);
    }

    #[test]
    fn report_has_title_breaks_between_fragments_and_footer() {
        let ds = dataset(12, 25);
        let config = ReportConfig::default();
        let items = build_report(&ds, &config, date()).unwrap();

        assert!(matches!(&items[0], ReportItem::Title(t) if t == "Merged Data Report"));
        assert!(matches!(items[1], ReportItem::Spacer(_)));
        assert!(
            matches!(items.last(), Some(ReportItem::Footer(f)) if f.ends_with("Signature Date: 2024-03-09"))
        );

        let tables = items
            .iter()
            .filter(|i| matches!(i, ReportItem::Table(_)))
            .count();
        let breaks = items
            .iter()
            .filter(|i| matches!(i, ReportItem::PageBreak))
            .count();
        // 12 columns of 72pt fit 10 per 720pt page: 2 column groups x 3 row groups.
        assert_eq!(tables, 6);
        assert_eq!(breaks, tables - 1);
        assert!(!matches!(items[items.len() - 3], ReportItem::PageBreak));
    }

    #[test]
    fn fragments_carry_matching_widths() {
        let ds = Dataset::new(
            vec!["user_id".into(), "description".into()],
            vec![vec!["1".into(), "x".repeat(17)]],
        )
        .unwrap();
        let items = build_report(&ds, &ReportConfig::default(), date()).unwrap();
        let fragment = items
            .iter()
            .find_map(|i| match i {
                ReportItem::Table(t) => Some(t),
                _ => None,
            })
            .unwrap();
        assert!(fragment.header_row);
        assert_eq!(fragment.cells.len(), 2);
        assert_eq!(fragment.col_widths.len(), 2);
        assert!((fragment.col_widths[1] - 17.0 * 7.2).abs() < 1e-3);
    }

    #[test]
    fn empty_dataset_is_empty_result() {
        let no_rows = Dataset::new(vec!["user_id".into()], vec![]).unwrap();
        assert!(matches!(
            build_report(&no_rows, &ReportConfig::default(), date()),
            Err(Error::EmptyResult)
        ));
        assert!(matches!(
            build_report(&Dataset::default(), &ReportConfig::default(), date()),
            Err(Error::EmptyResult)
        ));
    }

    #[test]
    fn invalid_geometry_is_layout_error() {
        let config = ReportConfig {
            max_rows_per_page: 0,
            ..ReportConfig::default()
        };
        assert!(matches!(
            build_report(&dataset(1, 1), &config, date()),
            Err(Error::Layout(_))
        ));
    }
}
