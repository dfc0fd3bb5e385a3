//! Cost model of the simulated optimizer.
//!
//! Each base table is read by the cheapest of:
//!
//! - a full table scan: `rows * ROW_SCAN_COST`;
//! - an index range scan with row lookups, for an index whose leading
//!   columns are pinned by `=`/`IN` predicates, optionally followed by one
//!   range-restricted column: `matched_rows * (INDEX_SCAN_COST + ROW_LOOKUP_COST)`;
//! - an index merge, for an `OR` whose every branch tests the leading column
//!   of some index: the sum of the branch scans plus `INDEX_MERGE_OVERHEAD`.
//!   Rows matched by two branches are fetched once if either branch's index
//!   carries the other branch's column, since the duplicate is then visible
//!   on the index entry.
//!
//! A single-table select with `ORDER BY` pays a sort unless the chosen index
//! range scan already returns rows in that order.

use catalog::{Index, TableSchema, TableStats};
use compile::visit::{ColumnRef, CompareOp, Predicate, TableRef};

pub const DEFAULT_ROW_COUNT: u64 = 10_000;
pub const EQ_SELECTIVITY: f64 = 0.1;
pub const RANGE_SELECTIVITY: f64 = 0.3;
pub const BETWEEN_SELECTIVITY: f64 = 0.25;
pub const ROW_SCAN_COST: f64 = 1.0;
pub const INDEX_SCAN_COST: f64 = 0.5;
pub const ROW_LOOKUP_COST: f64 = 1.5;
pub const INDEX_MERGE_OVERHEAD: f64 = 10.0;
pub const SORT_COST: f64 = 0.05;

/// What the model knows about one table of a statement.
pub(crate) struct TableInput<'a> {
    pub table_ref: &'a TableRef,
    pub schema: Option<&'a TableSchema>,
    pub stats: Option<&'a TableStats>,
    /// Physical and hypothetical indexes, in key order.
    pub indexes: Vec<&'a Index>,
}

impl<'a> TableInput<'a> {
    pub fn row_count(&self) -> f64 {
        self.stats
            .map_or(DEFAULT_ROW_COUNT, TableStats::row_count)
            .max(1) as f64
    }

    fn eq_selectivity(&self, column_name: &str) -> f64 {
        self.stats
            .and_then(|stats| stats.distinct(column_name))
            .map_or(EQ_SELECTIVITY, |ndv| 1.0 / ndv as f64)
    }

    fn has_column(&self, column_name: &str) -> bool {
        self.schema
            .map_or(false, |schema| schema.column(column_name).is_some())
    }

    /// Selectivity of an `=` or `IN` predicate.
    fn point_selectivity(&self, predicate: &Predicate) -> Option<f64> {
        match predicate {
            Predicate::Compare {
                column,
                op: CompareOp::Eq,
            } => Some(self.eq_selectivity(&column.name)),
            Predicate::InList { column, len } => {
                Some((*len as f64 * self.eq_selectivity(&column.name)).min(1.0))
            }
            _ => None,
        }
    }

    fn range_selectivity(&self, predicate: &Predicate) -> Option<f64> {
        match predicate {
            Predicate::Compare { op, .. } if *op != CompareOp::Eq => Some(RANGE_SELECTIVITY),
            Predicate::Between { .. } => Some(BETWEEN_SELECTIVITY),
            _ => None,
        }
    }

    fn selectivity(&self, predicate: &Predicate) -> f64 {
        match predicate {
            Predicate::Or(branches) => branches
                .iter()
                .map(|branch| self.selectivity(branch))
                .sum::<f64>()
                .min(1.0),
            Predicate::Opaque => 1.0,
            simple => self
                .point_selectivity(simple)
                .or_else(|| self.range_selectivity(simple))
                .unwrap_or(1.0),
        }
    }
}

/// Assigns each conjunct to the table it filters.
pub(crate) fn conjuncts_of<'p>(
    tables: &[TableInput<'_>],
    position: usize,
    conjuncts: &'p [Predicate],
) -> Vec<&'p Predicate> {
    conjuncts
        .iter()
        .filter(|predicate| match predicate {
            Predicate::Or(branches) => {
                !branches.is_empty()
                    && branches.iter().all(|branch| {
                        branch
                            .column()
                            .map_or(false, |column| owner(tables, column) == Some(position))
                    })
            }
            simple => simple
                .column()
                .map_or(false, |column| owner(tables, column) == Some(position)),
        })
        .collect()
}

fn owner(tables: &[TableInput<'_>], column: &ColumnRef) -> Option<usize> {
    match &column.qualifier {
        Some(qualifier) => tables
            .iter()
            .position(|table| table.table_ref.answers_to(qualifier)),
        None if tables.len() == 1 => Some(0),
        None => tables
            .iter()
            .position(|table| table.has_column(&column.name)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AccessPath<'a> {
    TableScan,
    IndexRange {
        index: &'a Index,
        rows: f64,
        /// Index columns after the `=`-pinned prefix: the order rows come out in.
        order: Vec<String>,
    },
    IndexMerge {
        branches: Vec<(&'a Index, f64)>,
        /// Rows fetched from the table after duplicates are dropped.
        lookups: f64,
    },
}

/// The chosen access path for one table, with its cost and output cardinality.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Access<'a> {
    pub path: AccessPath<'a>,
    pub cost: f64,
    pub out_rows: f64,
    pub sort_cost: f64,
}

impl<'a> Access<'a> {
    pub fn total(&self) -> f64 {
        self.cost + self.sort_cost
    }
}

fn sort_cost(rows: f64) -> f64 {
    rows * rows.max(2.0).log2() * SORT_COST
}

fn index_range<'a>(
    table: &TableInput<'a>,
    index: &'a Index,
    predicates: &[&Predicate],
) -> Option<AccessPath<'a>> {
    let mut selectivity = 1.0;
    let mut matched = 0;
    let mut pinned = 0;

    for column in index.columns() {
        let on_column: Vec<&Predicate> = predicates
            .iter()
            .copied()
            .filter(|p| p.column().map_or(false, |c| &c.name == column.column_name()))
            .collect();

        let point = on_column
            .iter()
            .filter_map(|p| table.point_selectivity(p))
            .reduce(f64::min);
        if let Some(point) = point {
            selectivity *= point;
            matched += 1;
            pinned += 1;
            continue;
        }

        let range = on_column
            .iter()
            .filter_map(|p| table.range_selectivity(p))
            .reduce(f64::min);
        if let Some(range) = range {
            selectivity *= range;
            matched += 1;
        }
        break;
    }

    if matched == 0 {
        return None;
    }

    Some(AccessPath::IndexRange {
        index,
        rows: (table.row_count() * selectivity).max(1.0),
        order: index.columns()[pinned..]
            .iter()
            .map(|c| c.column_name().clone())
            .collect(),
    })
}

fn index_merge<'a>(table: &TableInput<'a>, predicate: &Predicate) -> Option<AccessPath<'a>> {
    let Predicate::Or(branches) = predicate else {
        return None;
    };

    let mut scans = Vec::with_capacity(branches.len());
    let mut tested = Vec::with_capacity(branches.len());
    for branch in branches {
        let column = branch.column()?;
        let index = table.indexes.iter().copied().find(|index| {
            index
                .leading_column()
                .map_or(false, |c| c.column_name() == &column.name)
        })?;
        let selectivity = table.selectivity(branch);
        scans.push((index, (table.row_count() * selectivity).max(1.0)));
        tested.push((column.name.as_str(), selectivity));
    }

    let mut duplicates = 0.0;
    for (i, (left, _)) in scans.iter().enumerate() {
        for (j, (right, _)) in scans.iter().enumerate().skip(i + 1) {
            let ((left_column, left_sel), (right_column, right_sel)) = (tested[i], tested[j]);
            if left_column != right_column
                && (carries(left, right_column) || carries(right, left_column))
            {
                duplicates += table.row_count() * left_sel * right_sel;
            }
        }
    }

    let rows: f64 = scans.iter().map(|(_, rows)| rows).sum();
    Some(AccessPath::IndexMerge {
        branches: scans,
        lookups: (rows - duplicates).max(1.0),
    })
}

fn carries(index: &Index, column_name: &str) -> bool {
    index
        .columns()
        .iter()
        .any(|column| column.column_name() == column_name)
}

fn path_cost(table: &TableInput<'_>, path: &AccessPath<'_>) -> f64 {
    match path {
        AccessPath::TableScan => table.row_count() * ROW_SCAN_COST,
        AccessPath::IndexRange { rows, .. } => rows * (INDEX_SCAN_COST + ROW_LOOKUP_COST),
        AccessPath::IndexMerge { branches, lookups } => {
            let rows: f64 = branches.iter().map(|(_, rows)| rows).sum();
            rows * INDEX_SCAN_COST + lookups * ROW_LOOKUP_COST + INDEX_MERGE_OVERHEAD
        }
    }
}

fn provides_order(path: &AccessPath<'_>, order_by: &[String]) -> bool {
    match path {
        AccessPath::IndexRange { order, .. } => {
            order_by.len() <= order.len() && order.iter().zip(order_by).all(|(a, b)| a == b)
        }
        _ => false,
    }
}

/// Picks the cheapest access path of `table`. `order_by` holds the sort
/// columns when the statement's sort can be served by this table alone.
pub(crate) fn choose_access<'a>(
    table: &TableInput<'a>,
    predicates: &[&Predicate],
    order_by: Option<&[String]>,
) -> Access<'a> {
    let out_rows = predicates
        .iter()
        .map(|predicate| table.selectivity(predicate))
        .product::<f64>()
        * table.row_count();
    let out_rows = out_rows.max(1.0);

    let mut paths = vec![AccessPath::TableScan];
    paths.extend(
        table
            .indexes
            .iter()
            .copied()
            .filter_map(|index| index_range(table, index, predicates)),
    );
    paths.extend(
        predicates
            .iter()
            .filter_map(|predicate| index_merge(table, predicate)),
    );

    let mut best: Option<Access<'a>> = None;
    for path in paths {
        let cost = path_cost(table, &path);
        let sort_cost = match order_by {
            Some(order_by) if !order_by.is_empty() && !provides_order(&path, order_by) => {
                sort_cost(out_rows)
            }
            _ => 0.0,
        };
        let access = Access {
            path,
            cost,
            out_rows,
            sort_cost,
        };
        if best.as_ref().map_or(true, |best| access.total() < best.total()) {
            best = Some(access);
        }
    }

    best.unwrap_or(Access {
        path: AccessPath::TableScan,
        cost: table.row_count() * ROW_SCAN_COST,
        out_rows,
        sort_cost: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Column;
    use pretty_assertions_sorted::assert_eq;

    fn table_ref(name: &str) -> TableRef {
        TableRef {
            schema: None,
            name: name.to_string(),
            alias: None,
        }
    }

    fn index(columns: &[&str]) -> Index {
        Index::new(
            "test",
            "t",
            columns.iter().map(|c| Column::new("test", "t", c)).collect(),
        )
    }

    fn eq(column: &str) -> Predicate {
        Predicate::Compare {
            column: ColumnRef::new(None, column),
            op: CompareOp::Eq,
        }
    }

    fn gt(column: &str) -> Predicate {
        Predicate::Compare {
            column: ColumnRef::new(None, column),
            op: CompareOp::Gt,
        }
    }

    fn input<'a>(table_ref: &'a TableRef, indexes: &'a [Index]) -> TableInput<'a> {
        TableInput {
            table_ref,
            schema: None,
            stats: None,
            indexes: indexes.iter().collect(),
        }
    }

    #[test]
    fn test_table_scan_without_indexes() {
        let t = table_ref("t");
        let predicates = [eq("a")];
        let access = choose_access(&input(&t, &[]), &predicates.iter().collect::<Vec<_>>(), None);

        assert_eq!(access.path, AccessPath::TableScan);
        assert_eq!(access.cost, 10_000.0);
        assert_eq!(access.out_rows, 1_000.0);
    }

    #[test]
    fn test_equality_prefix_then_range() {
        let t = table_ref("t");
        let indexes = [index(&["a", "b", "c"])];
        let predicates = [eq("a"), gt("b"), eq("c")];
        let access = choose_access(
            &input(&t, &indexes),
            &predicates.iter().collect::<Vec<_>>(),
            None,
        );

        // 10000 * 0.1 (a) * 0.3 (b), c is past the range column.
        match &access.path {
            AccessPath::IndexRange { rows, order, .. } => {
                assert!((rows - 300.0).abs() < 1e-6);
                assert_eq!(order, &vec!["b".to_string(), "c".to_string()]);
            }
            other => panic!("unexpected path {:?}", other),
        }
        assert!((access.cost - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_index_not_entered_without_leading_column() {
        let t = table_ref("t");
        let indexes = [index(&["b", "a"])];
        let predicates = [eq("a")];
        let access = choose_access(
            &input(&t, &indexes),
            &predicates.iter().collect::<Vec<_>>(),
            None,
        );
        assert_eq!(access.path, AccessPath::TableScan);
    }

    #[test]
    fn test_index_merge_needs_every_branch() {
        let t = table_ref("t");
        let or = Predicate::Or(vec![eq("a"), eq("b")]);

        let one = [index(&["a"])];
        let access = choose_access(&input(&t, &one), &[&or], None);
        assert_eq!(access.path, AccessPath::TableScan);

        // 2000 rows scanned and fetched.
        let both = [index(&["a"]), index(&["b"])];
        let access = choose_access(&input(&t, &both), &[&or], None);
        assert!(matches!(access.path, AccessPath::IndexMerge { ref branches, .. } if branches.len() == 2));
        assert!((access.cost - 4_010.0).abs() < 1e-6);
    }

    #[test]
    fn test_index_merge_fetches_shared_rows_once() {
        let t = table_ref("t");
        let or = Predicate::Or(vec![eq("a"), eq("b")]);

        // `(b, a)` sees `a` on its entries, so the 100 rows with a = 1 and b = 1
        // are fetched once.
        let carried = [index(&["a"]), index(&["b", "a"])];
        let access = choose_access(&input(&t, &carried), &[&or], None);
        match &access.path {
            AccessPath::IndexMerge { lookups, .. } => assert!((lookups - 1_900.0).abs() < 1e-6),
            other => panic!("unexpected path {:?}", other),
        }
        assert!((access.cost - 3_860.0).abs() < 1e-6);

        // Carrying the other column in both indexes saves nothing more.
        let both_carried = [index(&["a", "b"]), index(&["b", "a"])];
        let access = choose_access(&input(&t, &both_carried), &[&or], None);
        assert!((access.cost - 3_860.0).abs() < 1e-6);

        // Branches on one column never match the same row twice.
        let same = Predicate::Or(vec![eq("a"), eq("a")]);
        let access = choose_access(&input(&t, &carried), &[&same], None);
        assert!((access.cost - 4_010.0).abs() < 1e-6);
    }

    #[test]
    fn test_sort_avoidance() {
        let t = table_ref("t");
        let indexes = [index(&["a", "b"])];
        let predicates = [eq("a")];
        let order_by = vec!["b".to_string()];
        let access = choose_access(
            &input(&t, &indexes),
            &predicates.iter().collect::<Vec<_>>(),
            Some(order_by.as_slice()),
        );

        assert!(matches!(access.path, AccessPath::IndexRange { .. }));
        assert_eq!(access.sort_cost, 0.0);

        let scan_only = choose_access(
            &input(&t, &[]),
            &predicates.iter().collect::<Vec<_>>(),
            Some(order_by.as_slice()),
        );
        assert!(scan_only.sort_cost > 0.0);
    }
}
