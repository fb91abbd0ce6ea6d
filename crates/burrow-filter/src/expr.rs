//! Filter expression parsing.

use std::fmt;

use crate::error::{FilterError, Result};
use crate::glob::Glob;

/// Comparison operator of a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Keep items where any value matches.
    Eq,
    /// Keep items where no value matches.
    NotEq,
}

impl Operator {
    /// The operator as written on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `KEY<op>VALUE` expression.
#[derive(Debug, Clone)]
pub struct Filter {
    key: String,
    operator: Operator,
    value: Glob,
}

impl Filter {
    /// Parse a single expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let has_eq = expr.contains("==");
        let has_ne = expr.contains("!=");

        let operator = match (has_eq, has_ne) {
            (true, false) => Operator::Eq,
            (false, true) => Operator::NotEq,
            (false, false) => {
                return Err(FilterError::format(expr, "expected KEY==VALUE or KEY!=VALUE"));
            }
            (true, true) => {
                return Err(FilterError::format(expr, "only one operator is allowed"));
            }
        };

        let parts: Vec<&str> = expr.split(operator.as_str()).collect();
        let [key, value] = parts.as_slice() else {
            return Err(FilterError::format(
                expr,
                format!("operator '{operator}' may appear only once"),
            ));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(FilterError::format(expr, "key is empty"));
        }

        let value = Glob::new(value.trim()).map_err(|reason| FilterError::format(expr, reason))?;

        Ok(Self {
            key: key.to_ascii_lowercase(),
            operator,
            value,
        })
    }

    /// Lowercased column name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The glob the values are matched against.
    pub fn pattern(&self) -> &str {
        self.value.as_str()
    }

    /// Evaluate the filter against the values of one item.
    ///
    /// `==` keeps the item when any value matches; `!=` keeps it when none
    /// does. An item with no values never satisfies `==`.
    pub fn matches<S: AsRef<str>>(&self, values: &[S]) -> bool {
        let any = values.iter().any(|v| self.value.is_match(v.as_ref()));
        match self.operator {
            Operator::Eq => any,
            Operator::NotEq => !any,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, self.operator, self.value.as_str())
    }
}

/// Parse a batch of expressions.
///
/// All-or-nothing: the first malformed expression rejects the whole batch.
pub fn parse<S: AsRef<str>>(exprs: &[S]) -> Result<Vec<Filter>> {
    exprs.iter().map(|e| Filter::parse(e.as_ref())).collect()
}
