use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

use sqlparser::ast::{BinaryOperator as SqlBinaryOperator, UnaryOperator as SqlUnaryOperator};

use self::agg::AggKind;
use self::function::FunctionKind;
use crate::catalog::{ColumnCatalog, ColumnRef};
use crate::errors::DatabaseError;
use crate::types::value::ValueRef;
use crate::types::LogicalType;

pub mod agg;
mod evaluator;
pub mod function;
pub mod simplify;
pub mod value_compute;

/// ScalarExpression represent all scalar expression in SQL.
/// SELECT a+1, b FROM t1.
/// a+1 -> ScalarExpression::Binary(a + 1)
/// b   -> ScalarExpression::ColumnRef()
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum ScalarExpression {
    Constant(ValueRef),
    ColumnRef(ColumnRef),
    Alias {
        expr: Box<ScalarExpression>,
        alias: String,
    },
    IsNull {
        negated: bool,
        expr: Box<ScalarExpression>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<ScalarExpression>,
        ty: LogicalType,
    },
    Binary {
        op: BinaryOperator,
        left_expr: Box<ScalarExpression>,
        right_expr: Box<ScalarExpression>,
        ty: LogicalType,
    },
    AggCall {
        distinct: bool,
        kind: AggKind,
        args: Vec<ScalarExpression>,
        ty: LogicalType,
    },
    Function {
        kind: FunctionKind,
        args: Vec<ScalarExpression>,
        ty: LogicalType,
    },
    Tuple(Vec<ScalarExpression>),
}

impl ScalarExpression {
    pub fn unpack_alias(&self) -> &ScalarExpression {
        if let ScalarExpression::Alias { expr, .. } = self {
            expr.unpack_alias()
        } else {
            self
        }
    }

    pub fn unpack_alias_ref(self) -> ScalarExpression {
        if let ScalarExpression::Alias { expr, .. } = self {
            expr.unpack_alias_ref()
        } else {
            self
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            ScalarExpression::Constant(value) => value.is_null(),
            ScalarExpression::ColumnRef(col) => col.nullable,
            ScalarExpression::Alias { expr, .. } => expr.nullable(),
            ScalarExpression::IsNull { .. } => false,
            ScalarExpression::Unary { expr, .. } => expr.nullable(),
            ScalarExpression::Binary {
                op,
                left_expr,
                right_expr,
                ..
            } => {
                matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo)
                    || left_expr.nullable()
                    || right_expr.nullable()
            }
            ScalarExpression::AggCall { kind, .. } => !matches!(kind, AggKind::Count),
            ScalarExpression::Function { kind, args, .. } => match kind {
                FunctionKind::Coalesce => args.iter().all(ScalarExpression::nullable),
                _ => args.iter().any(ScalarExpression::nullable),
            },
            ScalarExpression::Tuple(_) => false,
        }
    }

    pub fn return_type(&self) -> LogicalType {
        match self {
            Self::Constant(v) => v.logical_type(),
            Self::ColumnRef(col) => *col.datatype(),
            Self::Binary {
                ty: return_type, ..
            }
            | Self::Unary {
                ty: return_type, ..
            }
            | Self::AggCall {
                ty: return_type, ..
            }
            | Self::Function {
                ty: return_type, ..
            } => *return_type,
            Self::IsNull { .. } => LogicalType::Boolean,
            Self::Alias { expr, .. } => expr.return_type(),
            Self::Tuple(_) => LogicalType::Tuple,
        }
    }

    pub fn referenced_columns(&self) -> Vec<ColumnRef> {
        fn columns_collect(expr: &ScalarExpression, vec: &mut Vec<ColumnRef>) {
            match expr {
                ScalarExpression::ColumnRef(col) => {
                    vec.push(col.clone());
                }
                ScalarExpression::Alias { expr, .. }
                | ScalarExpression::IsNull { expr, .. }
                | ScalarExpression::Unary { expr, .. } => columns_collect(expr, vec),
                ScalarExpression::Binary {
                    left_expr,
                    right_expr,
                    ..
                } => {
                    columns_collect(left_expr, vec);
                    columns_collect(right_expr, vec);
                }
                ScalarExpression::AggCall { args, .. }
                | ScalarExpression::Function { args, .. }
                | ScalarExpression::Tuple(args) => {
                    for expr in args {
                        columns_collect(expr, vec)
                    }
                }
                ScalarExpression::Constant(_) => (),
            }
        }

        let mut exprs = Vec::new();

        columns_collect(self, &mut exprs);

        exprs
    }

    pub fn has_agg_call(&self) -> bool {
        match self {
            ScalarExpression::AggCall { .. } => true,
            ScalarExpression::Constant(_) | ScalarExpression::ColumnRef(_) => false,
            ScalarExpression::Alias { expr, .. }
            | ScalarExpression::IsNull { expr, .. }
            | ScalarExpression::Unary { expr, .. } => expr.has_agg_call(),
            ScalarExpression::Binary {
                left_expr,
                right_expr,
                ..
            } => left_expr.has_agg_call() || right_expr.has_agg_call(),
            ScalarExpression::Function { args, .. } | ScalarExpression::Tuple(args) => {
                args.iter().any(ScalarExpression::has_agg_call)
            }
        }
    }

    /// The column this expression produces when it is projected.
    pub fn output_column(&self) -> ColumnRef {
        match self {
            ScalarExpression::ColumnRef(col) => col.clone(),
            ScalarExpression::Alias { expr, alias } => Arc::new(ColumnCatalog::new_dummy(
                alias.to_string(),
                expr.nullable(),
                expr.return_type(),
            )),
            expr => Arc::new(ColumnCatalog::new_dummy(
                expr.to_string(),
                expr.nullable(),
                expr.return_type(),
            )),
        }
    }
}

impl fmt::Display for ScalarExpression {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ScalarExpression::Constant(value) => {
                if matches!(value.logical_type(), LogicalType::Varchar(_)) && !value.is_null() {
                    write!(f, "'{}'", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            ScalarExpression::ColumnRef(col) => write!(f, "{}", col.full_name()),
            ScalarExpression::Alias { alias, .. } => write!(f, "{}", alias),
            ScalarExpression::IsNull { negated, expr } => {
                let suffix = if *negated { "is not null" } else { "is null" };
                write!(f, "{} {}", expr, suffix)
            }
            ScalarExpression::Unary { op, expr, .. } => write!(f, "{}{}", op, expr),
            ScalarExpression::Binary {
                op,
                left_expr,
                right_expr,
                ..
            } => write!(f, "({} {} {})", left_expr, op, right_expr),
            ScalarExpression::AggCall {
                distinct,
                kind,
                args,
                ..
            } => {
                let args_str = if args.is_empty() {
                    "*".to_string()
                } else {
                    args.iter().map(|expr| expr.to_string()).join(", ")
                };
                let op = if kind.allow_distinct() && *distinct {
                    "DISTINCT "
                } else {
                    ""
                };
                write!(f, "{}({}{})", kind, op, args_str)
            }
            ScalarExpression::Function { kind, args, .. } => {
                write!(f, "{}({})", kind, args.iter().map(|expr| expr.to_string()).join(", "))
            }
            ScalarExpression::Tuple(exprs) => {
                write!(f, "({})", exprs.iter().map(|expr| expr.to_string()).join(", "))
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl TryFrom<SqlUnaryOperator> for UnaryOperator {
    type Error = DatabaseError;

    fn try_from(value: SqlUnaryOperator) -> Result<Self, Self::Error> {
        match value {
            SqlUnaryOperator::Plus => Ok(UnaryOperator::Plus),
            SqlUnaryOperator::Minus => Ok(UnaryOperator::Minus),
            SqlUnaryOperator::Not => Ok(UnaryOperator::Not),
            op => Err(DatabaseError::UnsupportedStmt(format!("unary operator {}", op))),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Minus => write!(f, "-"),
            UnaryOperator::Not => write!(f, "not "),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    StringConcat,

    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    NotEq,

    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Plus
                | BinaryOperator::Minus
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Gt
                | BinaryOperator::Lt
                | BinaryOperator::GtEq
                | BinaryOperator::LtEq
                | BinaryOperator::Eq
                | BinaryOperator::NotEq
        )
    }
}

impl TryFrom<SqlBinaryOperator> for BinaryOperator {
    type Error = DatabaseError;

    fn try_from(value: SqlBinaryOperator) -> Result<Self, Self::Error> {
        Ok(match value {
            SqlBinaryOperator::Plus => BinaryOperator::Plus,
            SqlBinaryOperator::Minus => BinaryOperator::Minus,
            SqlBinaryOperator::Multiply => BinaryOperator::Multiply,
            SqlBinaryOperator::Divide => BinaryOperator::Divide,
            SqlBinaryOperator::Modulo => BinaryOperator::Modulo,
            SqlBinaryOperator::StringConcat => BinaryOperator::StringConcat,
            SqlBinaryOperator::Gt => BinaryOperator::Gt,
            SqlBinaryOperator::Lt => BinaryOperator::Lt,
            SqlBinaryOperator::GtEq => BinaryOperator::GtEq,
            SqlBinaryOperator::LtEq => BinaryOperator::LtEq,
            SqlBinaryOperator::Eq => BinaryOperator::Eq,
            SqlBinaryOperator::NotEq => BinaryOperator::NotEq,
            SqlBinaryOperator::And => BinaryOperator::And,
            SqlBinaryOperator::Or => BinaryOperator::Or,
            op => return Err(DatabaseError::UnsupportedStmt(format!("binary operator {}", op))),
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BinaryOperator::Plus => write!(f, "+"),
            BinaryOperator::Minus => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Modulo => write!(f, "%"),
            BinaryOperator::StringConcat => write!(f, "||"),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::GtEq => write!(f, ">="),
            BinaryOperator::LtEq => write!(f, "<="),
            BinaryOperator::Eq => write!(f, "="),
            BinaryOperator::NotEq => write!(f, "!="),
            BinaryOperator::And => write!(f, "and"),
            BinaryOperator::Or => write!(f, "or"),
        }
    }
}
