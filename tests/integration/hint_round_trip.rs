//! End-to-end translation: compile a strategy into hints, then recover the
//! same strategy from the native plan report the backend would produce.

use serde_json::json;

use pgsteer::explain::{ExplainPlan, PlanOperator};
use pgsteer::hinting::generate_hints;
use pgsteer::model::table::table_set;
use pgsteer::model::{
    JoinOperator, JoinOperatorAssignment, JoinTree, JoinTreeNode, PhysicalOperatorAssignment,
    PlanParameterization, ScanOperator, SqlQuery, TableRef,
};
use pgsteer::session::{GeqoGuard, GeqoState, SessionControl};
use pgsteer::Result;

fn strategy() -> (SqlQuery, JoinTree, PhysicalOperatorAssignment) {
    let r = TableRef::new("r");
    let s = TableRef::new("s");
    let query = SqlQuery::with_tables(
        "SELECT * FROM r, s WHERE r.id = s.id",
        table_set([r.clone(), s.clone()]),
    );
    let tree = JoinTree::new(JoinTreeNode::join(
        JoinTreeNode::base_with_cardinality(r.clone(), 100.0),
        JoinTreeNode::base_with_cardinality(s.clone(), 10_000.0),
    ));
    let mut assignment = PhysicalOperatorAssignment::new();
    assignment.set_scan_operator(r.clone(), ScanOperator::SequentialScan);
    assignment.set_scan_operator(s.clone(), ScanOperator::IndexScan);
    assignment.set_join_operator(
        table_set([r, s]),
        JoinOperatorAssignment::new(JoinOperator::HashJoin),
    );
    (query, tree, assignment)
}

/// The report the backend would produce when executing under `strategy()`.
fn matching_report() -> serde_json::Value {
    json!([{
        "Planning Time": 4.5,
        "Execution Time": 380.0,
        "Plan": {
            "Node Type": "Hash Join",
            "Hash Cond": "(s.id = r.id)",
            "Total Cost": 410.0,
            "Plan Rows": 90,
            "Actual Total Time": 370.0,
            "Actual Rows": 85,
            "Actual Loops": 1,
            "Plans": [
                {
                    "Node Type": "Index Scan",
                    "Parent Relationship": "Outer",
                    "Relation Name": "s",
                    "Alias": "s",
                    "Index Name": "s_pkey",
                    "Total Cost": 300.0,
                    "Plan Rows": 10000
                },
                {
                    "Node Type": "Hash",
                    "Parent Relationship": "Inner",
                    "Total Cost": 60.0,
                    "Plan Rows": 100,
                    "Plans": [{
                        "Node Type": "Seq Scan",
                        "Parent Relationship": "Outer",
                        "Relation Name": "r",
                        "Alias": "r",
                        "Total Cost": 35.0,
                        "Plan Rows": 100
                    }]
                }
            ]
        }
    }])
}

#[test]
fn emitted_hints_match_the_normalized_plan() {
    let (query, tree, assignment) = strategy();
    let hinted = generate_hints(&query, Some(&tree), Some(&assignment), None)
        .expect("strategy is expressible");
    let clause = hinted.hints().expect("hints were attached");
    assert_eq!(
        clause.query_hints,
        "/*+\n  Leading((r s))\n  SeqScan(r)\n  IndexScan(s)\n  \n  HashJoin(r s)\n*/"
    );

    let plan = ExplainPlan::parse(&matching_report()).expect("report parses");
    let normalized = plan.plan();

    // Every operator choice must be recoverable from the normalized plan.
    for (tables, join_assignment) in assignment.join_operators() {
        let node = normalized
            .find_join(tables)
            .expect("the hinted join appears in the plan");
        assert_eq!(node.operator, PlanOperator::Join(join_assignment.operator));
    }
    for (table, scan_operator) in assignment.scan_operators() {
        let node = normalized
            .find_scan(table)
            .expect("the hinted scan appears in the plan");
        assert_eq!(node.operator, PlanOperator::Scan(scan_operator));
    }
}

#[test]
fn normalized_plan_reflects_the_model_conventions() {
    let plan = ExplainPlan::parse(&matching_report()).expect("report parses");
    let root = plan.plan();

    // The engine tags the hash build side as inner; the model treats the
    // probed index scan as the inner relation.
    assert_eq!(
        root.inner_child().expect("join has two inputs").node_type,
        "Index Scan"
    );
    assert_eq!(
        root.outer_child().expect("join has two inputs").node_type,
        "Hash"
    );
    assert_eq!(plan.planning_time(), 0.0045);
    assert_eq!(plan.execution_time(), 0.38);
}

#[derive(Default)]
struct ScriptedSession {
    statements: Vec<String>,
}

impl SessionControl for ScriptedSession {
    fn execute(&mut self, statement: &str) -> Result<()> {
        self.statements.push(statement.to_owned());
        Ok(())
    }

    fn fetch_setting(&mut self, name: &str) -> Result<String> {
        Ok(match name {
            "geqo" => "on".to_owned(),
            "geqo_threshold" => "2".to_owned(),
            _ => String::new(),
        })
    }
}

#[test]
fn guard_wraps_a_hinted_execution() {
    let (query, tree, assignment) = strategy();
    let hinted = generate_hints(&query, Some(&tree), Some(&assignment), None)
        .expect("strategy is expressible");

    let mut session = ScriptedSession::default();
    let guard = GeqoGuard::load(&mut session).expect("configuration readable");
    assert_eq!(
        guard.state(),
        &GeqoState {
            enabled: true,
            threshold: 2
        }
    );

    guard
        .prepare(&mut session, &hinted)
        .expect("session accepts statements");
    // ... the hinted query would run here ...
    guard
        .restore(&mut session)
        .expect("session accepts statements");

    assert_eq!(
        session.statements,
        vec![
            "SET geqo = 'off';",
            "SET geqo = 'on';",
            "SET geqo_threshold = 2;",
        ]
    );
}

#[test]
fn parameters_join_the_same_block() {
    let (query, tree, assignment) = strategy();
    let mut parameters = PlanParameterization::new();
    parameters.add_cardinality_hint(
        table_set([TableRef::new("r"), TableRef::new("s")]),
        64,
    );
    parameters.set_system_setting("work_mem", "1GB");

    let hinted = generate_hints(&query, Some(&tree), Some(&assignment), Some(&parameters))
        .expect("strategy is expressible");
    let clause = hinted.hints().expect("hints were attached");
    assert_eq!(clause.preparatory_statements, "SET work_mem = '1GB';");
    assert!(clause.query_hints.contains("Rows(r s #64)"));
}
