//! The seam through which condition modules evaluate nested clauses.

use serde_json::Value;

use crate::error::EngineError;

/// Evaluation services available to a condition module.
pub trait ConditionScope {
    /// Resolves a value ref or literal against the live state.
    fn lookup_ref(&self, reference: &Value) -> Value;

    /// Evaluates a nested if-clause. An absent clause is true.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DispatchNotFound` when the clause, or any clause
    /// nested inside it, names an unregistered op.
    fn eval_if(&self, clause: Option<&Value>) -> Result<bool, EngineError>;
}
