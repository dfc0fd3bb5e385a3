//! # Predicate Visitor
//!
//! A narrow view over the parse tree, exposing only what index selection needs:
//!
//! - [`walk_sql`] reports every column found in a filter, sort or grouping
//!   position to a [`SqlVisitor`], together with the base tables the
//!   statement references.
//! - [`select_shape`] describes a plain `SELECT`: its base tables, the
//!   top-level conjuncts of its `WHERE` clause (with `OR` chains flattened)
//!   and its `ORDER BY` columns.
//!
//! Column and table names are lower-cased.

use crate::diagnostics::CompileError;
use crate::parser::{parse_one, parse_sql};
use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    BinaryOperator, Expr, GroupByExpr, JoinConstraint, JoinOperator, ObjectName, Query, Select,
    SelectItem, SetExpr, Statement, TableAlias, TableFactor, TableWithJoins,
};
use std::fmt;

/// A column as written in the query: `a` or `t.a` (`qualifier` is the
/// table name or alias).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(qualifier: Option<&str>, name: &str) -> Self {
        Self {
            qualifier: qualifier.map(str::to_ascii_lowercase),
            name: name.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}.{}", qualifier, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A base table referenced in a `FROM` clause or as an update target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Whether `qualifier` designates this table, by alias or by name.
    pub fn answers_to(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias == qualifier,
            None => self.name == qualifier,
        }
    }
}

/// Where a harvested column appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnPosition {
    /// Operand of `=`, `<`, `<=`, `>` or `>=`.
    Comparison,
    /// Tested expression of `BETWEEN`.
    Between,
    /// Tested expression of `IN (...)`.
    InList,
    OrderBy,
    GroupBy,
}

pub trait SqlVisitor {
    fn visit_column(&mut self, column: &ColumnRef, position: ColumnPosition);

    fn visit_table(&mut self, _table: &TableRef) {}
}

/// Parses `sql` and reports its indexable column positions and base tables to `visitor`.
pub fn walk_sql<V: SqlVisitor>(sql: &str, visitor: &mut V) -> Result<(), CompileError> {
    for statement in parse_sql(sql)? {
        walk_statement(&statement, visitor);
    }
    Ok(())
}

fn walk_statement(statement: &Statement, visitor: &mut dyn SqlVisitor) {
    match statement {
        Statement::Query(query) => walk_query(query, visitor),
        Statement::Update {
            table, selection, ..
        } => {
            walk_table_with_joins(table, visitor);
            if let Some(selection) = selection {
                walk_expr(selection, visitor);
            }
        }
        Statement::Delete {
            from,
            using,
            selection,
            ..
        } => {
            for table in from.iter().chain(using.iter().flatten()) {
                walk_table_with_joins(table, visitor);
            }
            if let Some(selection) = selection {
                walk_expr(selection, visitor);
            }
        }
        Statement::Explain { statement, .. } => walk_statement(statement, visitor),
        _ => {}
    }
}

fn walk_query(query: &Query, visitor: &mut dyn SqlVisitor) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            walk_query(&cte.query, visitor);
        }
    }

    walk_set_expr(&query.body, visitor);

    // Sort keys are harvested, not descended into.
    for item in &query.order_by {
        harvest(&item.expr, ColumnPosition::OrderBy, visitor);
    }
}

fn walk_set_expr(set_expr: &SetExpr, visitor: &mut dyn SqlVisitor) {
    match set_expr {
        SetExpr::Select(select) => walk_select(select, visitor),
        SetExpr::Query(query) => walk_query(query, visitor),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, visitor);
            walk_set_expr(right, visitor);
        }
        _ => {}
    }
}

fn walk_select(select: &Select, visitor: &mut dyn SqlVisitor) {
    for table in &select.from {
        walk_table_with_joins(table, visitor);
    }

    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                walk_expr(expr, visitor)
            }
            _ => {}
        }
    }

    if let Some(selection) = &select.selection {
        walk_expr(selection, visitor);
    }

    if let GroupByExpr::Expressions(exprs) = &select.group_by {
        for expr in exprs {
            harvest(expr, ColumnPosition::GroupBy, visitor);
        }
    }

    if let Some(having) = &select.having {
        walk_expr(having, visitor);
    }
}

fn walk_table_with_joins(table: &TableWithJoins, visitor: &mut dyn SqlVisitor) {
    walk_table_factor(&table.relation, visitor);
    for join in &table.joins {
        walk_table_factor(&join.relation, visitor);
        if let Some(JoinConstraint::On(expr)) = join_constraint(&join.join_operator) {
            walk_expr(expr, visitor);
        }
    }
}

fn walk_table_factor(factor: &TableFactor, visitor: &mut dyn SqlVisitor) {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            visitor.visit_table(&table_ref(name, alias.as_ref()))
        }
        TableFactor::Derived { subquery, .. } => walk_query(subquery, visitor),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => walk_table_with_joins(table_with_joins, visitor),
        _ => {}
    }
}

fn walk_expr(expr: &Expr, visitor: &mut dyn SqlVisitor) {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            if compare_op(op).is_some() {
                harvest(left, ColumnPosition::Comparison, visitor);
                harvest(right, ColumnPosition::Comparison, visitor);
            }
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            harvest(expr, ColumnPosition::Between, visitor);
            walk_expr(expr, visitor);
            walk_expr(low, visitor);
            walk_expr(high, visitor);
        }
        Expr::InList { expr, list, .. } => {
            harvest(expr, ColumnPosition::InList, visitor);
            walk_expr(expr, visitor);
            for item in list {
                walk_expr(item, visitor);
            }
        }
        Expr::InSubquery { expr, subquery, .. } => {
            harvest(expr, ColumnPosition::InList, visitor);
            walk_expr(expr, visitor);
            walk_query(subquery, visitor);
        }
        Expr::Nested(inner)
        | Expr::UnaryOp { expr: inner, .. }
        | Expr::IsNull(inner)
        | Expr::IsNotNull(inner)
        | Expr::IsTrue(inner)
        | Expr::IsFalse(inner) => walk_expr(inner, visitor),
        Expr::Subquery(query) | Expr::Exists {
            subquery: query, ..
        } => walk_query(query, visitor),
        _ => {}
    }
}

fn harvest(expr: &Expr, position: ColumnPosition, visitor: &mut dyn SqlVisitor) {
    if let Some(column) = column_ref(expr) {
        visitor.visit_column(&column, position);
    }
}

fn column_ref(expr: &Expr) -> Option<ColumnRef> {
    match expr {
        Expr::Identifier(ident) => Some(ColumnRef::new(None, &ident.value)),
        Expr::CompoundIdentifier(idents) => {
            let (name, qualifiers) = idents.split_last()?;
            Some(ColumnRef::new(
                qualifiers.last().map(|ident| ident.value.as_str()),
                &name.value,
            ))
        }
        Expr::Nested(inner) => column_ref(inner),
        _ => None,
    }
}

fn table_ref(name: &ObjectName, alias: Option<&TableAlias>) -> TableRef {
    let idents = &name.0;
    let table = idents
        .last()
        .map(|ident| ident.value.to_ascii_lowercase())
        .unwrap_or_default();
    let schema = idents
        .len()
        .checked_sub(2)
        .and_then(|i| idents.get(i))
        .map(|ident| ident.value.to_ascii_lowercase());

    TableRef {
        schema,
        name: table,
        alias: alias.map(|alias| alias.name.value.to_ascii_lowercase()),
    }
}

fn join_constraint(operator: &JoinOperator) -> Option<&JoinConstraint> {
    match operator {
        JoinOperator::Inner(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint) => Some(constraint),
        _ => None,
    }
}

/// Comparison operators an index range can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// The operator seen from the other operand: `1 < a` is `a > 1`.
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::LtEq => CompareOp::GtEq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::LtEq,
        }
    }
}

fn compare_op(op: &BinaryOperator) -> Option<CompareOp> {
    match op {
        BinaryOperator::Eq => Some(CompareOp::Eq),
        BinaryOperator::Lt => Some(CompareOp::Lt),
        BinaryOperator::LtEq => Some(CompareOp::LtEq),
        BinaryOperator::Gt => Some(CompareOp::Gt),
        BinaryOperator::GtEq => Some(CompareOp::GtEq),
        _ => None,
    }
}

/// One conjunct of a `WHERE` clause. Only column-versus-constant tests are
/// given a shape; anything else (joins, functions, negations) is `Opaque`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    Compare { column: ColumnRef, op: CompareOp },
    Between { column: ColumnRef },
    InList { column: ColumnRef, len: usize },
    /// An `OR` chain, flattened. Branches that are themselves conjunctions are `Opaque`.
    Or(Vec<Predicate>),
    Opaque,
}

impl Predicate {
    /// The column tested by a simple predicate.
    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::Between { column }
            | Predicate::InList { column, .. } => Some(column),
            Predicate::Or(_) | Predicate::Opaque => None,
        }
    }

    /// `column = constant`, in either order.
    pub fn is_equality(&self) -> bool {
        matches!(
            self,
            Predicate::Compare {
                op: CompareOp::Eq,
                ..
            }
        )
    }
}

/// Shape of a plain single-block `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectShape {
    pub tables: Vec<TableRef>,
    pub conjuncts: Vec<Predicate>,
    pub order_by: Vec<ColumnRef>,
}

/// Describes `sql` if it is a single `SELECT` block (optionally with a `WITH`
/// clause); set operations and non-select statements yield `None`.
pub fn select_shape(sql: &str) -> Result<Option<SelectShape>, CompileError> {
    let Statement::Query(query) = parse_one(sql)? else {
        return Ok(None);
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Ok(None);
    };

    let mut tables = Vec::new();
    for table in &select.from {
        collect_base_tables(table, &mut tables);
    }

    let mut conjuncts = Vec::new();
    if let Some(selection) = &select.selection {
        flatten_and(selection, &mut conjuncts);
    }

    let order_by = query
        .order_by
        .iter()
        .filter_map(|item| column_ref(&item.expr))
        .collect();

    Ok(Some(SelectShape {
        tables,
        conjuncts,
        order_by,
    }))
}

fn collect_base_tables(table: &TableWithJoins, out: &mut Vec<TableRef>) {
    let factors = std::iter::once(&table.relation).chain(table.joins.iter().map(|j| &j.relation));
    for factor in factors {
        match factor {
            TableFactor::Table { name, alias, .. } => out.push(table_ref(name, alias.as_ref())),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => collect_base_tables(table_with_joins, out),
            _ => {}
        }
    }
}

fn flatten_and(expr: &Expr, out: &mut Vec<Predicate>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            flatten_and(left, out);
            flatten_and(right, out);
        }
        Expr::Nested(inner) => flatten_and(inner, out),
        _ => out.push(predicate(expr)),
    }
}

fn flatten_or(expr: &Expr, out: &mut Vec<Predicate>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            flatten_or(left, out);
            flatten_or(right, out);
        }
        Expr::Nested(inner) if is_or(inner) => flatten_or(inner, out),
        _ => out.push(predicate(expr)),
    }
}

fn is_or(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        }
    )
}

fn predicate(expr: &Expr) -> Predicate {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        } => {
            let mut branches = Vec::new();
            flatten_or(expr, &mut branches);
            Predicate::Or(branches)
        }
        Expr::BinaryOp { left, op, right } => {
            match (compare_op(op), column_ref(left), column_ref(right)) {
                (Some(op), Some(column), None) if is_constant(right) => {
                    Predicate::Compare { column, op }
                }
                (Some(op), None, Some(column)) if is_constant(left) => Predicate::Compare {
                    column,
                    op: op.flip(),
                },
                _ => Predicate::Opaque,
            }
        }
        Expr::Between {
            expr,
            negated: false,
            low,
            high,
        } if is_constant(low) && is_constant(high) => match column_ref(expr) {
            Some(column) => Predicate::Between { column },
            None => Predicate::Opaque,
        },
        Expr::InList {
            expr,
            list,
            negated: false,
        } if list.iter().all(is_constant) => match column_ref(expr) {
            Some(column) => Predicate::InList {
                column,
                len: list.len(),
            },
            None => Predicate::Opaque,
        },
        Expr::Nested(inner) => predicate(inner),
        _ => Predicate::Opaque,
    }
}

/// Literals, placeholders and casts or signs of them.
fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Value(_) | Expr::TypedString { .. } => true,
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => {
            is_constant(expr)
        }
        _ => false,
    }
}
