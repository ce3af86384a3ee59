use crate::expression::ScalarExpression;
use crate::planner::operator::sort::SortField;
use crate::planner::operator::table_scan::TableScanOperator;
use crate::planner::operator::Operator;
use crate::planner::LogicalPlan;
use itertools::Itertools;

/// The order a plan node's rows are known to arrive in.
///
/// `constants` lists expressions that hold a single value over every row, so
/// they never influence the order and can be skipped on both sides of a
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ordering {
    keys: Vec<SortField>,
    constants: Vec<ScalarExpression>,
}

impl Ordering {
    pub fn new(keys: Vec<SortField>, constants: Vec<ScalarExpression>) -> Self {
        Ordering { keys, constants }
    }

    pub fn keys(&self) -> &[SortField] {
        &self.keys
    }

    pub fn constants(&self) -> &[ScalarExpression] {
        &self.constants
    }

    /// Order of the whole output stream of `plan`.
    pub fn of(plan: &LogicalPlan) -> Ordering {
        match plan.operator() {
            Operator::TableScan(op) => {
                if op.is_salted() {
                    Ordering::default()
                } else {
                    Self::primary_key_order(op)
                }
            }
            Operator::Filter(op) => {
                let mut ordering = plan.child().map(Ordering::of).unwrap_or_default();

                ordering.add_constants(op.predicate.constant_bindings());
                ordering
            }
            Operator::Aggregate(op) => {
                let child_constants = plan
                    .child()
                    .map(|child| Ordering::of(child).constants)
                    .unwrap_or_default();
                let retarget =
                    |expr: &ScalarExpression| ScalarExpression::ColumnRef(expr.output_column());

                let keys = op
                    .groupby_exprs
                    .iter()
                    .map(|expr| SortField::with_default_nulls(retarget(expr), true))
                    .collect_vec();
                let constants = op
                    .groupby_exprs
                    .iter()
                    .filter(|expr| child_constants.contains(expr))
                    .map(retarget)
                    .collect_vec();

                Ordering::new(keys, constants)
            }
            Operator::Sort(op) => {
                let constants = plan
                    .child()
                    .map(|child| Ordering::of(child).constants)
                    .unwrap_or_default();

                Ordering::new(op.sort_fields.clone(), constants)
            }
            Operator::Limit(_) => plan.child().map(Ordering::of).unwrap_or_default(),
            Operator::Project(_) => Ordering::default(),
        }
    }

    /// Order inside each region stream of `plan`, when `plan` reads regions
    /// directly (a scan, optionally filtered).
    pub fn of_partitions(plan: &LogicalPlan) -> Option<Ordering> {
        match plan.operator() {
            Operator::TableScan(op) => Some(Self::primary_key_order(op)),
            Operator::Filter(op) => {
                let mut ordering = Self::of_partitions(plan.child()?)?;

                ordering.add_constants(op.predicate.constant_bindings());
                Some(ordering)
            }
            _ => None,
        }
    }

    fn primary_key_order(op: &TableScanOperator) -> Ordering {
        let keys = op
            .primary_keys
            .iter()
            .map(|column| {
                SortField::with_default_nulls(
                    ScalarExpression::ColumnRef(column.clone()),
                    !column.desc.is_descending(),
                )
            })
            .collect_vec();

        Ordering::new(keys, vec![])
    }

    fn add_constants(&mut self, constants: Vec<ScalarExpression>) {
        for expr in constants {
            if !self.constants.contains(&expr) {
                self.constants.push(expr);
            }
        }
    }

    fn is_constant(&self, expr: &ScalarExpression) -> bool {
        matches!(expr, ScalarExpression::Constant(_)) || self.constants.contains(expr)
    }

    /// Whether rows in this order are already sorted by `required`.
    pub fn satisfies(&self, required: &[SortField]) -> bool {
        let mut provided = self.keys.iter().filter(|key| !self.is_constant(&key.expr));
        let mut matched: Vec<&ScalarExpression> = Vec::with_capacity(required.len());

        for field in required {
            // a repeated key is already fully ordered by its first occurrence
            if self.is_constant(&field.expr) || matched.contains(&&field.expr) {
                continue;
            }
            match provided.next() {
                Some(key) if key.same_order(field) => matched.push(&field.expr),
                _ => return false,
            }
        }

        true
    }
}
