//! Cost-expression mini-language.
//!
//! A cost expression is a parenthesized sequence of postfix tokens, e.g.
//! `(hpwl)(1.0)(*)(disp)(+)`: named objective terms, numeric literals, and
//! the binary operators `+ - * /`. It is evaluated once per staged candidate
//! against the per-objective deltas; any values left on the stack at the end
//! are summed, so a bare `(hpwl)` is the identity expression.

use std::collections::HashMap;

/// Errors raised while parsing or evaluating a cost expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostExprError {
    /// The expression has text outside `(...)` groups or an unclosed group.
    #[error("malformed cost expression near '{0}'")]
    Malformed(String),

    /// The expression contains no tokens.
    #[error("empty cost expression")]
    Empty,

    /// A binary operator found fewer than two stack operands.
    #[error("operator '{0}' is missing operands")]
    MissingOperands(char),

    /// A named term has no value in the evaluation environment.
    #[error("unknown cost term '{0}'")]
    UnknownTerm(String),
}

/// A binary operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl CostOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            CostOp::Add => a + b,
            CostOp::Sub => a - b,
            CostOp::Mul => a * b,
            CostOp::Div => a / b,
        }
    }

    fn symbol(self) -> char {
        match self {
            CostOp::Add => '+',
            CostOp::Sub => '-',
            CostOp::Mul => '*',
            CostOp::Div => '/',
        }
    }
}

/// One token of a parsed cost expression.
#[derive(Debug, Clone, PartialEq)]
enum CostToken {
    Term(String),
    Literal(f64),
    Op(CostOp),
}

/// A parsed, evaluatable cost expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CostExpr {
    tokens: Vec<CostToken>,
}

impl CostExpr {
    /// Parses an expression like `(hpwl)(1.0)(*)(disp)(+)`.
    pub fn parse(text: &str) -> Result<Self, CostExprError> {
        let mut tokens = Vec::new();
        let mut rest = text.trim();
        while !rest.is_empty() {
            let Some(stripped) = rest.strip_prefix('(') else {
                return Err(CostExprError::Malformed(rest.to_string()));
            };
            let Some(close) = stripped.find(')') else {
                return Err(CostExprError::Malformed(rest.to_string()));
            };
            let inner = stripped[..close].trim();
            tokens.push(Self::token(inner, rest)?);
            rest = stripped[close + 1..].trim();
        }
        if tokens.is_empty() {
            return Err(CostExprError::Empty);
        }
        Ok(Self { tokens })
    }

    fn token(inner: &str, context: &str) -> Result<CostToken, CostExprError> {
        match inner {
            "" => Err(CostExprError::Malformed(context.to_string())),
            "+" => Ok(CostToken::Op(CostOp::Add)),
            "-" => Ok(CostToken::Op(CostOp::Sub)),
            "*" => Ok(CostToken::Op(CostOp::Mul)),
            "/" => Ok(CostToken::Op(CostOp::Div)),
            _ => match inner.parse::<f64>() {
                Ok(value) => Ok(CostToken::Literal(value)),
                Err(_) => Ok(CostToken::Term(inner.to_string())),
            },
        }
    }

    /// The default pure-wirelength expression, `(hpwl)`.
    pub fn hpwl() -> Self {
        Self {
            tokens: vec![CostToken::Term("hpwl".to_string())],
        }
    }

    /// The named objective terms this expression references.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            CostToken::Term(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Evaluates the expression against per-term values.
    ///
    /// Postfix stack evaluation; remaining stack values are summed.
    pub fn eval(&self, values: &HashMap<&str, f64>) -> Result<f64, CostExprError> {
        let mut stack: Vec<f64> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                CostToken::Literal(value) => stack.push(*value),
                CostToken::Term(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| CostExprError::UnknownTerm(name.clone()))?;
                    stack.push(*value);
                }
                CostToken::Op(op) => {
                    let b = stack.pop();
                    let a = stack.pop();
                    match (a, b) {
                        (Some(a), Some(b)) => stack.push(op.apply(a, b)),
                        _ => return Err(CostExprError::MissingOperands(op.symbol())),
                    }
                }
            }
        }
        if stack.is_empty() {
            return Err(CostExprError::Empty);
        }
        Ok(stack.into_iter().sum())
    }
}

impl Default for CostExpr {
    fn default() -> Self {
        Self::hpwl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&'static str, f64)]) -> HashMap<&'static str, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn single_term() {
        let expr = CostExpr::parse("(hpwl)").unwrap();
        assert_eq!(expr.eval(&env(&[("hpwl", -12.5)])).unwrap(), -12.5);
    }

    #[test]
    fn weighted_sum() {
        let expr = CostExpr::parse("(hpwl)(2.0)(*)(disp)(+)").unwrap();
        let value = expr.eval(&env(&[("hpwl", 3.0), ("disp", 4.0)])).unwrap();
        assert_eq!(value, 10.0);
    }

    #[test]
    fn leftover_stack_is_summed() {
        let expr = CostExpr::parse("(hpwl)(disp)").unwrap();
        let value = expr.eval(&env(&[("hpwl", 1.0), ("disp", 2.0)])).unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn subtraction_and_division_order() {
        let expr = CostExpr::parse("(8.0)(2.0)(-)").unwrap();
        assert_eq!(expr.eval(&env(&[])).unwrap(), 6.0);
        let expr = CostExpr::parse("(8.0)(2.0)(/)").unwrap();
        assert_eq!(expr.eval(&env(&[])).unwrap(), 4.0);
    }

    #[test]
    fn terms_listed() {
        let expr = CostExpr::parse("(hpwl)(0.5)(*)(disp)(+)").unwrap();
        let terms: Vec<&str> = expr.terms().collect();
        assert_eq!(terms, vec!["hpwl", "disp"]);
    }

    #[test]
    fn unknown_term_rejected_at_eval() {
        let expr = CostExpr::parse("(timing)").unwrap();
        assert_eq!(
            expr.eval(&env(&[])).unwrap_err(),
            CostExprError::UnknownTerm("timing".to_string())
        );
    }

    #[test]
    fn malformed_inputs_rejected() {
        assert!(matches!(
            CostExpr::parse("hpwl"),
            Err(CostExprError::Malformed(_))
        ));
        assert!(matches!(
            CostExpr::parse("(hpwl"),
            Err(CostExprError::Malformed(_))
        ));
        assert!(matches!(
            CostExpr::parse("()"),
            Err(CostExprError::Malformed(_))
        ));
        assert_eq!(CostExpr::parse(""), Err(CostExprError::Empty));
    }

    #[test]
    fn operator_underflow_rejected() {
        let expr = CostExpr::parse("(hpwl)(+)").unwrap();
        assert_eq!(
            expr.eval(&env(&[("hpwl", 1.0)])).unwrap_err(),
            CostExprError::MissingOperands('+')
        );
    }

    #[test]
    fn default_is_pure_hpwl() {
        assert_eq!(CostExpr::default(), CostExpr::hpwl());
    }
}
