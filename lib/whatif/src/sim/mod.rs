//! # Simulated Optimizer
//!
//! An in-process [`WhatIfOptimizer`] over a set of table definitions and
//! statistics. It honours `USE <schema>` and `CREATE TABLE`, keeps
//! hypothetical indexes per session, and explains queries with the cost
//! model in [`model`]. Costs are deterministic: the same session state and
//! query always produce the same plan.

pub mod model;

use crate::{OracleError, Plan, PlanRow, WhatIfOptimizer};
use catalog::{Index, TableSchema, TableStats};
use common::{Set, SetKey};
use compile::visit::{select_shape, walk_sql, ColumnPosition, ColumnRef, SqlVisitor, TableRef};
use core::fmt;
use model::{choose_access, conjuncts_of, Access, AccessPath, TableInput};
use std::time::Duration;
use tracing::{debug, instrument, trace};
use workload::WorkloadInfo;

pub struct SimulatedOptimizer {
    tables: Set<TableSchema>,
    stats: Set<TableStats>,
    hypo_indexes: Set<Index>,
    current_schema: String,
}

impl fmt::Debug for SimulatedOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedOptimizer")
            .field("tables", &self.tables.key_string())
            .field("hypo_indexes", &self.hypo_indexes.key_string())
            .field("current_schema", &self.current_schema)
            .finish()
    }
}

impl SimulatedOptimizer {
    pub fn new(default_schema: &str) -> Self {
        Self {
            tables: Set::new(),
            stats: Set::new(),
            hypo_indexes: Set::new(),
            current_schema: default_schema.to_ascii_lowercase(),
        }
    }

    /// A session knowing the tables and statistics of `workload`.
    pub fn from_workload(workload: &WorkloadInfo, default_schema: &str) -> Self {
        let mut optimizer = Self::new(default_schema);
        optimizer.tables = workload.table_schemas().clone();
        optimizer.stats = workload.table_stats().clone();
        optimizer
    }

    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.add(table);
    }

    pub fn add_stats(&mut self, stats: TableStats) {
        self.stats.add(stats);
    }

    pub fn current_schema(&self) -> &str {
        &self.current_schema
    }

    pub fn hypo_indexes(&self) -> &Set<Index> {
        &self.hypo_indexes
    }

    fn table_input<'a>(&'a self, table_ref: &'a TableRef) -> TableInput<'a> {
        let schema_name = table_ref.schema.as_deref().unwrap_or(self.current_schema.as_str());
        let key = format!("{}.{}", schema_name, table_ref.name);
        let schema = self.tables.get(&key);

        let mut indexes: Vec<&Index> = schema
            .map(|schema| schema.indexes().iter().collect())
            .unwrap_or_default();
        indexes.extend(
            self.hypo_indexes
                .iter()
                .filter(|index| index.table_key() == key),
        );
        indexes.sort_by_key(|index| index.key());
        indexes.dedup_by_key(|index| index.key());

        TableInput {
            table_ref,
            schema,
            stats: self.stats.get(&key),
            indexes,
        }
    }

    fn plan_select(&self, query: &str) -> Result<Option<Plan>, OracleError> {
        let Some(shape) = select_shape(query).map_err(|err| explain_error(query, err))? else {
            return Ok(None);
        };

        let tables: Vec<TableInput> = shape
            .tables
            .iter()
            .map(|table_ref| self.table_input(table_ref))
            .collect();

        // A sort can be served by an index only when one table is read.
        let order_by: Option<Vec<String>> = (tables.len() == 1)
            .then(|| shape.order_by.iter().map(|c| c.name.clone()).collect());

        let accesses: Vec<Access> = tables
            .iter()
            .enumerate()
            .map(|(position, table)| {
                let predicates = conjuncts_of(&tables, position, &shape.conjuncts);
                choose_access(table, &predicates, order_by.as_deref())
            })
            .collect();

        Ok(Some(render(&tables, &accesses)))
    }

    fn plan_scan(&self, query: &str) -> Result<Plan, OracleError> {
        let mut collector = TableCollector::default();
        walk_sql(query, &mut collector).map_err(|err| explain_error(query, err))?;

        let tables: Vec<TableInput> = collector
            .tables
            .iter()
            .map(|table_ref| self.table_input(table_ref))
            .collect();
        let accesses: Vec<Access> = tables
            .iter()
            .map(|table| choose_access(table, &[], None))
            .collect();

        Ok(render(&tables, &accesses))
    }
}

fn explain_error(query: &str, err: impl fmt::Display) -> OracleError {
    OracleError::Explain {
        query: query.to_string(),
        reason: err.to_string(),
    }
}

#[derive(Default)]
struct TableCollector {
    tables: Vec<TableRef>,
}

impl SqlVisitor for TableCollector {
    fn visit_column(&mut self, _column: &ColumnRef, _position: ColumnPosition) {}

    fn visit_table(&mut self, table: &TableRef) {
        self.tables.push(table.clone());
    }
}

struct Node {
    name: &'static str,
    rows: f64,
    cost: f64,
    task: &'static str,
    access_object: String,
    operator_info: String,
    children: Vec<Node>,
}

impl Node {
    fn new(name: &'static str, rows: f64, cost: f64, task: &'static str) -> Self {
        Self {
            name,
            rows,
            cost,
            task,
            access_object: String::new(),
            operator_info: String::new(),
            children: Vec::new(),
        }
    }

    fn access(mut self, access_object: String) -> Self {
        self.access_object = access_object;
        self
    }

    fn info(mut self, operator_info: String) -> Self {
        self.operator_info = operator_info;
        self
    }

    fn children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    fn flatten(&self, prefix: &str, connector: &str, next_id: &mut usize, out: &mut Vec<PlanRow>) {
        *next_id += 1;
        out.push(
            PlanRow::builder()
                .id(format!("{}{}{}_{}", prefix, connector, self.name, next_id))
                .est_rows(self.rows)
                .est_cost(self.cost)
                .task(self.task)
                .access_object(self.access_object.clone())
                .operator_info(self.operator_info.clone())
                .build(),
        );

        let child_prefix = match connector {
            "" => String::new(),
            "├─" => format!("{}│ ", prefix),
            _ => format!("{}  ", prefix),
        };
        for (i, child) in self.children.iter().enumerate() {
            let connector = if i + 1 == self.children.len() { "└─" } else { "├─" };
            child.flatten(&child_prefix, connector, next_id, out);
        }
    }
}

fn index_object(table: &TableInput, index: &Index) -> String {
    format!(
        "table:{}, index:{}({})",
        table.table_ref.name,
        index.index_name(),
        index.column_names().join(", ")
    )
}

fn access_node(table: &TableInput, access: &Access) -> Node {
    let table_object = format!("table:{}", table.table_ref.name);
    let reader = match &access.path {
        AccessPath::TableScan => Node::new("TableReader", access.out_rows, access.cost, "root")
            .children(vec![Node::new(
                "TableFullScan",
                table.row_count(),
                access.cost,
                "cop",
            )
            .access(table_object)]),
        AccessPath::IndexRange { index, rows, .. } => {
            Node::new("IndexLookUp", access.out_rows, access.cost, "root").children(vec![
                Node::new("IndexRangeScan", *rows, rows * model::INDEX_SCAN_COST, "cop")
                    .access(index_object(table, index)),
                Node::new("TableRowIDScan", *rows, rows * model::ROW_LOOKUP_COST, "cop")
                    .access(table_object),
            ])
        }
        AccessPath::IndexMerge { branches, lookups } => {
            let mut children: Vec<Node> = branches
                .iter()
                .map(|(index, rows)| {
                    Node::new("IndexRangeScan", *rows, rows * model::INDEX_SCAN_COST, "cop")
                        .access(index_object(table, index))
                })
                .collect();
            children.push(
                Node::new("TableRowIDScan", *lookups, lookups * model::ROW_LOOKUP_COST, "cop")
                    .access(table_object),
            );
            Node::new("IndexMerge", access.out_rows, access.cost, "root")
                .info("type: union".to_string())
                .children(children)
        }
    };

    if access.sort_cost > 0.0 {
        Node::new("Sort", access.out_rows, access.total(), "root").children(vec![reader])
    } else {
        reader
    }
}

fn render(tables: &[TableInput], accesses: &[Access]) -> Plan {
    let total: f64 = accesses.iter().map(Access::total).sum();
    let rows = accesses
        .iter()
        .map(|access| access.out_rows)
        .fold(1.0, f64::max);

    let mut children: Vec<Node> = tables
        .iter()
        .zip(accesses)
        .map(|(table, access)| access_node(table, access))
        .collect();
    if children.len() > 1 {
        children = vec![Node::new("HashJoin", rows, total, "root").children(children)];
    }

    let root = Node::new("Projection", rows, total, "root").children(children);
    let mut out = Vec::new();
    root.flatten("", "", &mut 0, &mut out);
    Plan::new(out)
}

impl WhatIfOptimizer for SimulatedOptimizer {
    #[instrument(skip(self))]
    fn execute(&mut self, statement: &str) -> Result<(), OracleError> {
        let statement = statement.trim().trim_end_matches(';').trim();
        let mut words = statement.split_whitespace();
        let first = words.next().unwrap_or_default().to_ascii_lowercase();

        match first.as_str() {
            "use" => {
                let Some(schema) = words.next() else {
                    return Err(OracleError::Execute {
                        statement: statement.to_string(),
                        reason: "missing schema name".to_string(),
                    });
                };
                self.current_schema = schema.trim_matches('`').to_ascii_lowercase();
                debug!(schema = %self.current_schema, "Switched schema");
            }
            "create" if statement.to_ascii_lowercase().starts_with("create table") => {
                let table = TableSchema::from_create_statement(&self.current_schema, statement)
                    .map_err(|err| OracleError::Execute {
                        statement: statement.to_string(),
                        reason: err.to_string(),
                    })?;
                debug!(table = %table.key(), "Created table");
                self.tables.add(table);
            }
            _ => trace!("Ignored statement"),
        }

        Ok(())
    }

    fn create_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        let fail = |reason: String| OracleError::CreateHypoIndex {
            index: index.key(),
            reason,
        };

        let table = self
            .tables
            .get(&index.table_key())
            .ok_or_else(|| fail(format!("unknown table {}", index.table_key())))?;
        if let Some(missing) = index
            .columns()
            .iter()
            .find(|column| table.column(column.column_name()).is_none())
        {
            return Err(fail(format!("unknown column {}", missing.column_name())));
        }
        if self.hypo_indexes.contains(index) {
            return Err(fail("already exists".to_string()));
        }

        self.hypo_indexes.add(index.clone());
        Ok(())
    }

    fn drop_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        self.hypo_indexes
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| OracleError::DropHypoIndex {
                index: index.key(),
                reason: "no such hypothetical index".to_string(),
            })
    }

    fn explain(&mut self, query: &str) -> Result<Plan, OracleError> {
        let plan = match self.plan_select(query)? {
            Some(plan) => plan,
            None => self.plan_scan(query)?,
        };
        trace!(query, cost = plan.cost(), "Explained");
        Ok(plan)
    }

    /// Explains `query`, reporting one microsecond of execution per unit of cost.
    fn explain_analyze(&mut self, query: &str) -> Result<Plan, OracleError> {
        let plan = self.explain(query)?;
        let elapsed = Duration::from_secs_f64(plan.cost() / 1_000_000.0);
        Ok(plan.with_execution_time(elapsed))
    }
}
