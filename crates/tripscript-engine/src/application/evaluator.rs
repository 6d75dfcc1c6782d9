//! Trigger evaluation and conditional collapse.
//!
//! Every trigger is considered in declaration order. A live trigger whose
//! event spec matches and whose `if` clause holds fires: its firing time is
//! recorded in the history and its action nodes collapse into the flat list
//! of action calls that actually run. Nothing here fails; problems with one
//! trigger or node degrade to a log instruction for that trigger or node.

use tracing::instrument;
use tripscript_core::condition::ConditionScope;
use tripscript_core::context::ActionContext;
use tripscript_core::error::EngineError;
use tripscript_core::instruction::Instruction;
use tripscript_core::script::{flag, str_field};
use tripscript_schema::{Category, Registry};

use crate::application::conditions::ConditionEvaluator;
use crate::application::dispatcher::ActionDispatcher;
use crate::application::matcher::EventMatcher;
use crate::domain::{ActionCall, ActionNode, Branch, Trigger};

/// One step of a collapsed action list.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// An action call to dispatch.
    Dispatch(ActionCall),
    /// A node that could not be collapsed.
    Degraded(Instruction),
}

/// What became of one trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// Not live, not matched, or its condition failed.
    Skipped,
    /// The trigger could not be evaluated.
    Degraded(Instruction),
    /// The trigger fired.
    Fired {
        /// Trigger name.
        name: String,
        /// Collapsed actions, in order.
        steps: Vec<Step>,
    },
}

impl TriggerOutcome {
    /// History record for a fired trigger.
    #[must_use]
    pub fn history(&self, context: &ActionContext<'_>) -> Option<Instruction> {
        match self {
            Self::Fired { name, .. } => Some(Instruction::UpdateTripHistory {
                history: [(name.clone(), context.evaluate_at)].into_iter().collect(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerEvaluator<'r> {
    registry: &'r Registry,
}

impl<'r> TriggerEvaluator<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Evaluates the context's event against every trigger and dispatches
    /// the collapsed actions of those that fire, concatenating the results
    /// in trigger order. Without an event nothing fires.
    #[must_use]
    #[instrument(skip_all, fields(event = ?context.event.map(|e| &e.kind)))]
    pub fn evaluate(&self, context: &ActionContext<'_>) -> Vec<Instruction> {
        let dispatcher = ActionDispatcher::new(self.registry);
        let mut instructions = Vec::new();
        for outcome in self.outcomes(context) {
            instructions.extend(outcome.history(context));
            match outcome {
                TriggerOutcome::Skipped => {}
                TriggerOutcome::Degraded(instruction) => instructions.push(instruction),
                TriggerOutcome::Fired { steps, .. } => {
                    for step in steps {
                        match step {
                            Step::Dispatch(call) => {
                                instructions.extend(dispatcher.apply(&call.name, &call.params, context));
                            }
                            Step::Degraded(instruction) => instructions.push(instruction),
                        }
                    }
                }
            }
        }
        instructions
    }

    /// Outcome of every trigger, in declaration order.
    #[must_use]
    pub fn outcomes(&self, context: &ActionContext<'_>) -> Vec<TriggerOutcome> {
        context
            .script
            .collection("triggers")
            .iter()
            .map(|resource| match Trigger::from_value(resource) {
                Ok(trigger) => self.evaluate_trigger(&trigger, context),
                Err(err) => {
                    tracing::warn!(error = %err, "unreadable trigger skipped");
                    TriggerOutcome::Degraded(Instruction::error(format!("Skipped unreadable trigger: {err}.")))
                }
            })
            .collect()
    }

    /// Decides whether one trigger fires for the context's event.
    #[must_use]
    pub fn evaluate_trigger(&self, trigger: &Trigger, context: &ActionContext<'_>) -> TriggerOutcome {
        let Some(event) = context.event else {
            return TriggerOutcome::Skipped;
        };
        if trigger.event_type() != event.kind {
            return TriggerOutcome::Skipped;
        }
        let conditions = ConditionEvaluator::new(self.registry, *context);
        match is_live(trigger, context, &conditions) {
            Ok(true) => {}
            Ok(false) => return TriggerOutcome::Skipped,
            Err(err) => return degraded(trigger, &err),
        }
        let module = match self.registry.lookup(Category::Events, trigger.event_type()) {
            Ok(module) => module,
            Err(err) => {
                tracing::warn!(trigger = %trigger.name, error = %err, "trigger skipped");
                return TriggerOutcome::Skipped;
            }
        };
        if !EventMatcher::new(self.registry).matches(module, &trigger.event, event, context) {
            return TriggerOutcome::Skipped;
        }
        match conditions.eval_if(trigger.condition.as_ref()) {
            Ok(true) => {}
            Ok(false) => return TriggerOutcome::Skipped,
            Err(err) => return degraded(trigger, &err),
        }
        tracing::debug!(trigger = %trigger.name, "trigger fired");
        TriggerOutcome::Fired {
            name: trigger.name.clone(),
            steps: self.collapse(&trigger.actions, context),
        }
    }

    /// Resolves conditionals into the flat list of actions to run.
    #[must_use]
    pub fn collapse(&self, nodes: &[ActionNode], context: &ActionContext<'_>) -> Vec<Step> {
        let conditions = ConditionEvaluator::new(self.registry, *context);
        let mut steps = Vec::new();
        for node in nodes {
            match node {
                ActionNode::Action(call) => steps.push(Step::Dispatch(call.clone())),
                ActionNode::Conditional {
                    primary,
                    elseifs,
                    otherwise,
                } => match select(&conditions, primary, elseifs) {
                    Ok(branch) => steps.extend(self.collapse(branch.unwrap_or(otherwise.as_slice()), context)),
                    Err(err) => {
                        tracing::warn!(error = %err, "conditional skipped");
                        steps.push(Step::Degraded(Instruction::error(format!("Skipped conditional: {err}."))));
                    }
                },
            }
        }
        steps
    }
}

fn is_live(
    trigger: &Trigger,
    context: &ActionContext<'_>,
    conditions: &ConditionEvaluator<'_>,
) -> Result<bool, EngineError> {
    // Time triggers fire once.
    if trigger.event_type() == "time_occurred" && context.evaluation.history.contains_key(&trigger.name) {
        return Ok(false);
    }
    let Some(scene_name) = trigger.scene.as_deref() else {
        return Ok(true);
    };
    let Some(scene) = context.script.find("scenes", scene_name) else {
        return Ok(false);
    };
    if !conditions.eval_if(scene.get("active_if"))? {
        return Ok(false);
    }
    Ok(flag(scene, "global") || context.evaluation.current_scene_name() == str_field(scene, "name"))
}

/// First branch whose condition holds, `None` when none does.
fn select<'n>(
    conditions: &ConditionEvaluator<'_>,
    primary: &'n Branch,
    elseifs: &'n [Branch],
) -> Result<Option<&'n [ActionNode]>, EngineError> {
    for branch in std::iter::once(primary).chain(elseifs) {
        if conditions.eval_if(branch.condition.as_ref())? {
            return Ok(Some(&branch.actions));
        }
    }
    Ok(None)
}

fn degraded(trigger: &Trigger, err: &EngineError) -> TriggerOutcome {
    tracing::warn!(trigger = %trigger.name, error = %err, "trigger skipped");
    TriggerOutcome::Degraded(Instruction::error(format!(
        "Skipped trigger \"{}\": {err}.",
        trigger.name
    )))
}
