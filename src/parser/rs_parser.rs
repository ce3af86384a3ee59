use sqlparser::ast::{Expr, OrderByExpr, SelectItem};
use sqlparser::dialect::Dialect;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::{Token, Tokenizer};

/// SQL fragment parser based on [`sqlparser`]
///
/// Each method consumes the whole input or fails.
pub(crate) struct RSParser<'a> {
    parser: Parser<'a>,
}

impl<'a> RSParser<'a> {
    /// Create a new parser for the specified tokens using the
    /// [`GenericDialect`].
    pub(crate) fn new(sql: &str) -> Result<Self, ParserError> {
        let dialect = &GenericDialect {};
        RSParser::new_with_dialect(sql, dialect)
    }

    /// Create a new parser for the specified tokens with the
    /// specified dialect.
    pub(crate) fn new_with_dialect(
        sql: &str,
        dialect: &'a dyn Dialect,
    ) -> Result<Self, ParserError> {
        let mut tokenizer = Tokenizer::new(dialect, sql);
        let tokens = tokenizer.tokenize()?;

        Ok(RSParser {
            parser: Parser::new(dialect).with_tokens(tokens),
        })
    }

    fn finish<T>(mut self, parsed: T) -> Result<T, ParserError> {
        self.parser.expect_token(&Token::EOF)?;
        Ok(parsed)
    }

    /// e.g. `k1, k2 AS x, count(*)`
    pub(crate) fn parse_select_items(mut self) -> Result<Vec<SelectItem>, ParserError> {
        let items = self.parser.parse_comma_separated(Parser::parse_select_item)?;
        self.finish(items)
    }

    /// e.g. `1 DESC, (l_discount, l_quantity) NULLS FIRST`
    pub(crate) fn parse_order_by(mut self) -> Result<Vec<OrderByExpr>, ParserError> {
        let order_by = self.parser.parse_comma_separated(Parser::parse_order_by_expr)?;
        self.finish(order_by)
    }

    pub(crate) fn parse_expr(mut self) -> Result<Expr, ParserError> {
        let expr = self.parser.parse_expr()?;
        self.finish(expr)
    }

    pub(crate) fn parse_exprs(mut self) -> Result<Vec<Expr>, ParserError> {
        let exprs = self.parser.parse_comma_separated(Parser::parse_expr)?;
        self.finish(exprs)
    }
}

#[cfg(test)]
mod test {
    use crate::parser::rs_parser::RSParser;
    use sqlparser::ast::{Expr, SelectItem};
    use sqlparser::parser::ParserError;

    #[test]
    fn test_parse_fragments() -> Result<(), ParserError> {
        let items = RSParser::new("col1 + col2, col4 AS c, *")?.parse_select_items()?;
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], SelectItem::ExprWithAlias { .. }));

        let order_by = RSParser::new("(l_discount, l_quantity) DESC NULLS LAST, 2")?.parse_order_by()?;
        assert_eq!(order_by.len(), 2);
        assert!(matches!(order_by[0].expr, Expr::Tuple(_)));
        assert_eq!(order_by[0].asc, Some(false));
        assert_eq!(order_by[0].nulls_first, Some(false));
        assert_eq!(order_by[1].asc, None);

        assert!(RSParser::new("k2 = 'ABC' garbage")?.parse_expr().is_err());

        Ok(())
    }
}
