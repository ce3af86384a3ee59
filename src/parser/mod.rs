pub(crate) mod rs_parser;

use crate::errors::DatabaseError;
use crate::parser::rs_parser::RSParser;
use sqlparser::ast::{Expr, OrderByExpr, SelectItem};

/// A single-table query assembled from SQL fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub(crate) table_name: String,
    /// Empty selects every column
    pub(crate) projection: Vec<SelectItem>,
    pub(crate) selection: Option<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) distinct: bool,
    pub(crate) order_by: Vec<OrderByExpr>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,
}

impl Select {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn order_by(&self) -> &[OrderByExpr] {
        &self.order_by
    }
}

/// ```ignore
/// let select = SelectBuilder::from("t1")
///     .columns("col1 + col2, col4, a_string")?
///     .filter("col1 > 10")?
///     .order_by("1, 2 DESC NULLS LAST")?
///     .limit(10)
///     .build();
/// ```
pub struct SelectBuilder {
    select: Select,
}

impl SelectBuilder {
    pub fn from(table_name: &str) -> Self {
        SelectBuilder {
            select: Select {
                table_name: table_name.to_lowercase(),
                projection: vec![],
                selection: None,
                group_by: vec![],
                distinct: false,
                order_by: vec![],
                limit: None,
                offset: None,
            },
        }
    }

    pub fn columns(mut self, sql: &str) -> Result<Self, DatabaseError> {
        self.select.projection = RSParser::new(sql)?.parse_select_items()?;
        Ok(self)
    }

    pub fn filter(mut self, sql: &str) -> Result<Self, DatabaseError> {
        self.select.selection = Some(RSParser::new(sql)?.parse_expr()?);
        Ok(self)
    }

    pub fn group_by(mut self, sql: &str) -> Result<Self, DatabaseError> {
        self.select.group_by = RSParser::new(sql)?.parse_exprs()?;
        Ok(self)
    }

    pub fn distinct(mut self) -> Self {
        self.select.distinct = true;
        self
    }

    pub fn order_by(mut self, sql: &str) -> Result<Self, DatabaseError> {
        self.select.order_by = RSParser::new(sql)?.parse_order_by()?;
        Ok(self)
    }

    /// ORDER BY items built by hand instead of parsed.
    pub fn order_by_exprs(mut self, order_by: Vec<OrderByExpr>) -> Self {
        self.select.order_by = order_by;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.select.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.select.offset = Some(offset);
        self
    }

    pub fn build(self) -> Select {
        self.select
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::parser::SelectBuilder;

    #[test]
    fn test_select_builder() -> Result<(), DatabaseError> {
        let select = SelectBuilder::from("E_Table")
            .columns("col1+col2, col4, a_string")?
            .filter("col1 > 10 AND col4 IS NOT NULL")?
            .order_by("1, 2")?
            .limit(2)
            .build();

        assert_eq!(select.table_name(), "e_table");
        assert_eq!(select.projection.len(), 3);
        assert!(select.selection.is_some());
        assert_eq!(select.order_by().len(), 2);
        assert_eq!(select.limit, Some(2));

        assert!(matches!(
            SelectBuilder::from("t").order_by("a ASC ASC"),
            Err(DatabaseError::Parser(_))
        ));

        Ok(())
    }
}
