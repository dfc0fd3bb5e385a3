use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Prefix of the root operator of a common table expression's sub-plan.
const CTE_PREFIX: &str = "CTE_";

/// One operator of an explained plan, in `EXPLAIN` table form.
///
/// `id` carries the tree drawing: top-level operators have no leading
/// indentation, children are prefixed with `└─`, `├─` or `│ `.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters)]
#[getset(get = "pub")]
pub struct PlanRow {
    #[builder(setter(into))]
    id: String,
    est_rows: f64,
    est_cost: f64,
    #[builder(default = "root".to_string(), setter(into))]
    task: String,
    #[builder(default, setter(into))]
    access_object: String,
    #[builder(default, setter(into))]
    operator_info: String,
}

impl PlanRow {
    /// Whether the operator is the root of a tree rather than a child.
    pub fn is_top_level(&self) -> bool {
        self.id
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphanumeric())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Plan {
    rows: Vec<PlanRow>,
    /// Measured execution time, for analyzed plans only.
    execution_time: Option<Duration>,
}

impl Plan {
    pub fn new(rows: Vec<PlanRow>) -> Self {
        Self {
            rows,
            execution_time: None,
        }
    }

    pub fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = Some(execution_time);
        self
    }

    /// Estimated cost of the whole statement: the root operator's cost plus
    /// the root cost of every CTE sub-plan, which optimizers report as
    /// separate top-level trees.
    pub fn cost(&self) -> f64 {
        let Some((root, rest)) = self.rows.split_first() else {
            return 0.0;
        };

        root.est_cost
            + rest
                .iter()
                .filter(|row| row.is_top_level() && row.id.starts_with(CTE_PREFIX))
                .map(|row| row.est_cost)
                .sum::<f64>()
    }

    /// Whether any operator accesses the index named `index_name`.
    pub fn uses_index(&self, index_name: &str) -> bool {
        let needle = format!("index:{}(", index_name);
        self.rows
            .iter()
            .any(|row| row.access_object.contains(&needle))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id\testRows\testCost\ttask\taccess object\toperator info")?;
        for row in &self.rows {
            writeln!(
                f,
                "{}\t{:.2}\t{:.2}\t{}\t{}\t{}",
                row.id, row.est_rows, row.est_cost, row.task, row.access_object, row.operator_info
            )?;
        }
        Ok(())
    }
}
