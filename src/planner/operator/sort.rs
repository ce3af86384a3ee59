use crate::expression::ScalarExpression;
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;

/// Null placement when ORDER BY names none: nulls act as the largest value,
/// last when ascending and first when descending.
pub const fn default_nulls_first(asc: bool) -> bool {
    !asc
}

/// How an ORDER BY item named its expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum OrderSource {
    Position,
    Alias,
    Expression,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct SortField {
    pub expr: ScalarExpression,
    pub asc: bool,
    pub nulls_first: bool,
    pub source: OrderSource,
}

impl SortField {
    pub fn new(expr: ScalarExpression, asc: bool, nulls_first: bool) -> Self {
        SortField {
            expr,
            asc,
            nulls_first,
            source: OrderSource::Expression,
        }
    }

    pub fn with_default_nulls(expr: ScalarExpression, asc: bool) -> Self {
        SortField::new(expr, asc, default_nulls_first(asc))
    }

    pub fn with_source(mut self, source: OrderSource) -> Self {
        self.source = source;
        self
    }

    /// Both fields order rows identically. Null placement only matters when
    /// the expression can produce a null.
    pub fn same_order(&self, other: &SortField) -> bool {
        self.expr == other.expr
            && self.asc == other.asc
            && (self.nulls_first == other.nulls_first || !self.expr.nullable())
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.asc {
            write!(f, " Asc")?;
        } else {
            write!(f, " Desc")?;
        }
        if self.nulls_first {
            write!(f, " Nulls First")?;
        } else {
            write!(f, " Nulls Last")?;
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct SortOperator {
    pub sort_fields: Vec<SortField>,
    /// Support push down limit to sort plan.
    pub limit: Option<usize>,
}

impl fmt::Display for SortOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let sort_fields = self
            .sort_fields
            .iter()
            .map(|sort_field| format!("{}", sort_field))
            .join(", ");
        write!(f, "Sort By {}", sort_fields)?;

        if let Some(limit) = self.limit {
            write!(f, ", Limit {}", limit)?;
        }

        Ok(())
    }
}
