mod aggregate;
mod expr;
mod order_by;
mod select;

use crate::catalog::TableCatalog;
use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::parser::Select;
use crate::planner::LogicalPlan;
use sqlparser::ast::Ident;

/// Per-statement state shared by the bind steps.
pub struct BinderContext<'a> {
    table: &'a TableCatalog,
    /// Aggregate calls in the order they were first met
    agg_calls: Vec<ScalarExpression>,
    allow_agg: bool,
}

impl<'a> BinderContext<'a> {
    pub fn new(table: &'a TableCatalog) -> Self {
        BinderContext {
            table,
            agg_calls: vec![],
            allow_agg: true,
        }
    }
}

pub struct Binder<'a> {
    context: BinderContext<'a>,
}

impl<'a> Binder<'a> {
    pub fn new(context: BinderContext<'a>) -> Self {
        Binder { context }
    }

    pub fn bind(mut self, select: &Select) -> Result<LogicalPlan, DatabaseError> {
        self.bind_select(select)
    }
}

/// Unquoted identifiers are case-insensitive.
pub(crate) fn lower_ident(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}
