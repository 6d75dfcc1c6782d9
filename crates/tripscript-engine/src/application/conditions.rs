//! Evaluates `if` clauses through the registered condition ops.

use serde_json::Value;
use tripscript_core::condition::ConditionScope;
use tripscript_core::context::ActionContext;
use tripscript_core::error::EngineError;
use tripscript_schema::{Category, Registry};

use crate::modules::conditions::op_of;

/// Condition scope backed by the registry and a live action context.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    registry: &'a Registry,
    context: ActionContext<'a>,
}

impl<'a> ConditionEvaluator<'a> {
    #[must_use]
    pub fn new(registry: &'a Registry, context: ActionContext<'a>) -> Self {
        Self { registry, context }
    }
}

impl ConditionScope for ConditionEvaluator<'_> {
    fn lookup_ref(&self, reference: &Value) -> Value {
        self.context.lookup_ref(reference)
    }

    fn eval_if(&self, clause: Option<&Value>) -> Result<bool, EngineError> {
        let clause = match clause {
            None | Some(Value::Null) => return Ok(true),
            Some(Value::Object(clause)) => clause,
            Some(other) => {
                return Err(EngineError::DispatchNotFound {
                    category: Category::Conditions.as_str(),
                    discriminant: other.to_string(),
                });
            }
        };
        let module = self.registry.lookup(Category::Conditions, op_of(clause))?;
        let eval = module.eval_hook().ok_or_else(|| EngineError::DispatchNotFound {
            category: Category::Conditions.as_str(),
            discriminant: module.name.to_owned(),
        })?;
        eval(clause, self)
    }
}
