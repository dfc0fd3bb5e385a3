use catalog::{Column, Index, TableSchema};
use common::{Set, SetKey};
use metrics::OracleCall;
use pretty_assertions_sorted::assert_eq;
use whatif::sim::SimulatedOptimizer;
use whatif::{
    evaluate_cost, HypoIndexGuard, InstrumentedOptimizer, OracleError, Plan, PlanRow,
    WhatIfOptimizer,
};
use workload::{Query, WorkloadInfo};

/// Logs every call and prices each query at a fixed cost.
#[derive(Default)]
struct RecordingOptimizer {
    log: Vec<String>,
    live: Vec<String>,
    fail_create: Option<String>,
    fail_explain: Option<String>,
}

impl WhatIfOptimizer for RecordingOptimizer {
    fn execute(&mut self, statement: &str) -> Result<(), OracleError> {
        self.log.push(statement.to_string());
        Ok(())
    }

    fn create_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        if self.fail_create.as_deref() == Some(index.key().as_str()) {
            return Err(OracleError::CreateHypoIndex {
                index: index.key(),
                reason: "refused".to_string(),
            });
        }
        self.log.push(format!("create {}", index.key()));
        self.live.push(index.key());
        Ok(())
    }

    fn drop_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        self.log.push(format!("drop {}", index.key()));
        self.live.retain(|key| key != &index.key());
        Ok(())
    }

    fn explain(&mut self, query: &str) -> Result<Plan, OracleError> {
        if self.fail_explain.as_deref() == Some(query) {
            return Err(OracleError::Explain {
                query: query.to_string(),
                reason: "refused".to_string(),
            });
        }
        self.log.push(format!("explain {}", query));
        Ok(Plan::new(vec![PlanRow::builder()
            .id("Projection_1")
            .est_rows(1.0)
            .est_cost(100.0)
            .build()]))
    }

    fn explain_analyze(&mut self, query: &str) -> Result<Plan, OracleError> {
        self.explain(query)
    }
}

fn index(table: &str, columns: &[&str]) -> Index {
    Index::new(
        "test",
        table,
        columns.iter().map(|c| Column::new("test", table, c)).collect(),
    )
}

fn indexes(list: &[Index]) -> Set<Index> {
    list.iter().cloned().collect()
}

#[test]
fn test_evaluate_cost_weights_selects_and_switches_schema() {
    let workload = WorkloadInfo::new(
        vec![
            Query::new("s1", "select 1", 1),
            Query::new("s1", "select 2", 2),
            Query::new("s2", "select 3", 1),
            Query::new("s2", "insert into t values (1)", 5),
        ],
        vec![],
    );
    let mut optimizer = RecordingOptimizer::default();

    let cost = evaluate_cost(&mut optimizer, &workload, &indexes(&[index("t", &["a"])])).unwrap();

    assert_eq!(cost.total_workload_cost(), 400.0);
    assert_eq!(cost.total_number_of_index_columns(), 1);
    assert_eq!(
        optimizer.log,
        vec![
            "create test.t(a)",
            "USE s1",
            "explain select 1",
            "explain select 2",
            "USE s2",
            "explain select 3",
            "drop test.t(a)",
        ]
    );
}

#[test]
fn test_explain_failure_aborts_and_cleans_up() {
    let workload = WorkloadInfo::new(vec![Query::new("test", "select 1", 1)], vec![]);
    let mut optimizer = RecordingOptimizer {
        fail_explain: Some("select 1".to_string()),
        ..Default::default()
    };

    let result = evaluate_cost(
        &mut optimizer,
        &workload,
        &indexes(&[index("t", &["a"]), index("t", &["b"])]),
    );

    assert!(matches!(result, Err(OracleError::Explain { .. })));
    assert!(optimizer.live.is_empty());
}

#[test]
fn test_failed_creation_drops_created_indexes() {
    let mut optimizer = RecordingOptimizer {
        fail_create: Some("test.t(b)".to_string()),
        ..Default::default()
    };

    let result = HypoIndexGuard::create(
        &mut optimizer,
        &indexes(&[index("t", &["a"]), index("t", &["b"]), index("t", &["c"])]),
    );

    // The guard borrows the session; end that before looking at it.
    let failed = matches!(result, Err(OracleError::CreateHypoIndex { .. }));
    drop(result);

    assert!(failed);
    assert!(optimizer.live.is_empty());
    assert_eq!(optimizer.log, vec!["create test.t(a)", "drop test.t(a)"]);
}

#[test]
fn test_guard_drops_in_reverse_order_when_scope_ends() {
    let mut optimizer = RecordingOptimizer::default();
    {
        let guard = HypoIndexGuard::create(
            &mut optimizer,
            &indexes(&[index("t", &["a"]), index("t", &["b"])]),
        )
        .unwrap();
        assert_eq!(guard.indexes().len(), 2);
    }

    assert_eq!(
        optimizer.log,
        vec![
            "create test.t(a)",
            "create test.t(b)",
            "drop test.t(b)",
            "drop test.t(a)",
        ]
    );
}

#[test]
fn test_simulated_costs_reward_useful_indexes() {
    let table = TableSchema::from_create_statement("test", "create table t1 (a int, b int)").unwrap();
    let workload = WorkloadInfo::new(
        vec![Query::new("test", "select * from t1 where a = 1", 3)],
        vec![table],
    );
    let mut optimizer = InstrumentedOptimizer::new(SimulatedOptimizer::from_workload(&workload, "test"));

    let without = evaluate_cost(&mut optimizer, &workload, &Set::new()).unwrap();
    let with_a = evaluate_cost(&mut optimizer, &workload, &indexes(&[index("t1", &["a"])])).unwrap();
    let with_b = evaluate_cost(&mut optimizer, &workload, &indexes(&[index("t1", &["b"])])).unwrap();

    assert_eq!(without.total_workload_cost(), 30_000.0);
    assert_eq!(with_a.total_workload_cost(), 6_000.0);
    assert!(with_a.less(&without));
    // An unused index costs the same, and loses on column count.
    assert!(without.less(&with_b));
    assert!(optimizer.inner().hypo_indexes().is_empty());

    let stats = optimizer.stats();
    assert_eq!(stats.get(OracleCall::Execute).count(), 3);
    assert_eq!(stats.get(OracleCall::Explain).count(), 3);
    assert_eq!(stats.get(OracleCall::CreateHypoIndex).count(), 2);
    assert_eq!(stats.get(OracleCall::DropHypoIndex).count(), 2);

    optimizer.reset_stats();
    assert_eq!(optimizer.stats().total_calls(), 0);
}
