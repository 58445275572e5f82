use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// A linear combination of variables, keyed by variable id.
///
/// Terms on the same variable are merged on insertion, so a backend never
/// sees the same column twice in one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<String, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression with a single `coeff * id` term
    pub fn term(id: impl Into<String>, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(id, coeff);
        expr
    }

    /// Adds `coeff * id`, accumulating onto an existing term for `id`.
    pub fn add_term(&mut self, id: impl Into<String>, coeff: f64) {
        *self.terms.entry(id.into()).or_insert(0.0) += coeff;
    }

    /// Multiplies every coefficient by `factor`.
    pub fn scale(mut self, factor: f64) -> Self {
        for coeff in self.terms.values_mut() {
            *coeff *= factor;
        }
        self
    }

    /// Coefficient on `id`, zero when the variable does not appear.
    pub fn coefficient(&self, id: &str) -> f64 {
        self.terms.get(id).copied().unwrap_or(0.0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(|(id, coeff)| (id.as_str(), *coeff))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under `values`; missing variables count as zero.
    pub fn evaluate(&self, values: &BTreeMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(id, coeff)| coeff * values.get(id).copied().unwrap_or(0.0))
            .sum()
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: Self) {
        for (id, coeff) in rhs.terms {
            self.add_term(id, coeff);
        }
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut expr = Self::new();
        for (id, coeff) in iter {
            expr.add_term(id, coeff);
        }
        expr
    }
}

impl std::iter::Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::new(), |acc, expr| acc + expr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

/// `expr <cmp> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: Option<String>,
    pub expr: LinearExpr,
    pub comparison: Comparison,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(expr: LinearExpr, comparison: Comparison, rhs: f64) -> Self {
        Constraint {
            name: None,
            expr,
            comparison,
            rhs,
        }
    }

    pub fn le(expr: LinearExpr, rhs: f64) -> Self {
        Self::new(expr, Comparison::Le, rhs)
    }

    pub fn ge(expr: LinearExpr, rhs: f64) -> Self {
        Self::new(expr, Comparison::Ge, rhs)
    }

    pub fn eq(expr: LinearExpr, rhs: f64) -> Self {
        Self::new(expr, Comparison::Eq, rhs)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether `values` satisfies the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.comparison {
            Comparison::Le => lhs <= self.rhs + tolerance,
            Comparison::Ge => lhs >= self.rhs - tolerance,
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}
