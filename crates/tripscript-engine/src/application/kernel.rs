//! The cascading kernel.
//!
//! Processing an event evaluates every trigger, then runs each fired
//! trigger's actions one at a time against a working copy of the context
//! so later actions observe earlier effects. Events emitted along the way
//! are evaluated depth-first, right after the action that emitted them.
//! Within one cascade a trigger fires at most once. Actions following a
//! wait are returned as scheduled actions instead of being dispatched.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;
use tripscript_core::context::{ActionContext, EvaluationContext};
use tripscript_core::event::Event;
use tripscript_core::instruction::Instruction;
use tripscript_core::script::ScriptContent;
use tripscript_schema::Registry;

use crate::application::dispatcher::ActionDispatcher;
use crate::application::evaluator::{Step, TriggerEvaluator, TriggerOutcome};
use crate::domain::ActionCall;
use crate::modules::actions::WAIT_ACTIONS;

/// An action deferred until the external scheduler calls back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub name: String,
    pub params: Map<String, Value>,
    /// Trigger whose action list held the action.
    pub trigger_name: String,
    /// Event that fired the trigger.
    pub event: Option<Event>,
    pub scheduled_at: DateTime<Utc>,
}

/// Everything one cascade produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelResult {
    pub instructions: Vec<Instruction>,
    pub scheduled_actions: Vec<ScheduledAction>,
}

/// Runs cascades for one script at one logical instant.
#[derive(Debug, Clone, Copy)]
pub struct Kernel<'a> {
    registry: &'a Registry,
    script: &'a ScriptContent,
    evaluate_at: DateTime<Utc>,
}

struct Cascade {
    working: EvaluationContext,
    fired: BTreeSet<String>,
    result: KernelResult,
}

impl Cascade {
    fn new(context: &EvaluationContext) -> Self {
        Self {
            working: context.clone(),
            fired: BTreeSet::new(),
            result: KernelResult::default(),
        }
    }

    fn record(&mut self, instruction: Instruction) {
        self.working.absorb(&instruction);
        self.result.instructions.push(instruction);
    }
}

impl<'a> Kernel<'a> {
    #[must_use]
    pub fn new(registry: &'a Registry, script: &'a ScriptContent, evaluate_at: DateTime<Utc>) -> Self {
        Self {
            registry,
            script,
            evaluate_at,
        }
    }

    /// Processes an event and every event it cascades into.
    #[must_use]
    #[instrument(skip_all, fields(event = %event.kind))]
    pub fn process_event(&self, event: &Event, context: &EvaluationContext) -> KernelResult {
        let mut cascade = Cascade::new(context);
        self.run_event(event, &mut cascade);
        tracing::debug!(
            instructions = cascade.result.instructions.len(),
            scheduled = cascade.result.scheduled_actions.len(),
            "cascade complete"
        );
        cascade.result
    }

    /// Dispatches a previously scheduled action, cascading into any events
    /// it emits.
    #[must_use]
    #[instrument(skip_all, fields(action = %action.name, trigger = %action.trigger_name))]
    pub fn process_scheduled_action(&self, action: &ScheduledAction, context: &EvaluationContext) -> KernelResult {
        let mut cascade = Cascade::new(context);
        let call = ActionCall {
            name: action.name.clone(),
            params: action.params.clone(),
        };
        self.run_action(&call, action.event.as_ref(), &mut cascade);
        cascade.result
    }

    fn context<'c>(&self, working: &'c EvaluationContext, event: Option<&'c Event>, at: DateTime<Utc>) -> ActionContext<'c>
    where
        'a: 'c,
    {
        let context = ActionContext::new(self.script, working, at);
        match event {
            Some(event) => context.with_event(event),
            None => context,
        }
    }

    fn run_event(&self, event: &Event, cascade: &mut Cascade) {
        let outcomes = {
            let context = self.context(&cascade.working, Some(event), self.evaluate_at);
            TriggerEvaluator::new(self.registry).outcomes(&context)
        };
        for outcome in outcomes {
            match outcome {
                TriggerOutcome::Skipped => {}
                TriggerOutcome::Degraded(instruction) => cascade.record(instruction),
                TriggerOutcome::Fired { name, steps } => {
                    if !cascade.fired.insert(name.clone()) {
                        tracing::debug!(trigger = %name, "already fired in this cascade");
                        continue;
                    }
                    cascade.record(Instruction::UpdateTripHistory {
                        history: [(name.clone(), self.evaluate_at)].into_iter().collect(),
                    });
                    self.run_steps(&name, steps, event, cascade);
                }
            }
        }
    }

    fn run_steps(&self, trigger_name: &str, steps: Vec<Step>, event: &Event, cascade: &mut Cascade) {
        let mut waiting_until: Option<DateTime<Utc>> = None;
        for step in steps {
            let call = match step {
                Step::Degraded(instruction) => {
                    cascade.record(instruction);
                    continue;
                }
                Step::Dispatch(call) => call,
            };
            if WAIT_ACTIONS.contains(&call.name.as_str()) {
                waiting_until = self.run_wait(&call, event, waiting_until, cascade);
                continue;
            }
            match waiting_until {
                Some(scheduled_at) => cascade.result.scheduled_actions.push(ScheduledAction {
                    name: call.name,
                    params: call.params,
                    trigger_name: trigger_name.to_owned(),
                    event: Some(event.clone()),
                    scheduled_at,
                }),
                None => self.run_action(&call, Some(event), cascade),
            }
        }
    }

    /// Applies a wait relative to any wait already in effect and returns the
    /// new resume time. Only the first wait of a trigger is emitted.
    fn run_wait(
        &self,
        call: &ActionCall,
        event: &Event,
        waiting_until: Option<DateTime<Utc>>,
        cascade: &mut Cascade,
    ) -> Option<DateTime<Utc>> {
        let at = waiting_until.unwrap_or(self.evaluate_at);
        let instructions = {
            let context = self.context(&cascade.working, Some(event), at);
            ActionDispatcher::new(self.registry).apply(&call.name, &call.params, &context)
        };
        let mut resume = waiting_until;
        for instruction in instructions {
            match instruction {
                Instruction::WaitUntil { until } => {
                    let until = resume.map_or(until, |current| current.max(until));
                    if resume.is_none() && until > self.evaluate_at {
                        cascade.record(Instruction::WaitUntil { until });
                    }
                    resume = Some(until).filter(|until| *until > self.evaluate_at);
                }
                other => cascade.record(other),
            }
        }
        resume
    }

    fn run_action(&self, call: &ActionCall, event: Option<&Event>, cascade: &mut Cascade) {
        let instructions = {
            let context = self.context(&cascade.working, event, self.evaluate_at);
            ActionDispatcher::new(self.registry).apply(&call.name, &call.params, &context)
        };
        for instruction in instructions {
            let emitted = match &instruction {
                Instruction::EmitEvent { event } => Some(event.clone()),
                _ => None,
            };
            cascade.record(instruction);
            if let Some(emitted) = emitted {
                self.run_event(&emitted, cascade);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;
    use chrono::TimeDelta;
    use serde_json::json;
    use tripscript_core::instruction::LogLevel;
    use tripscript_test_support::{ContextBuilder, ScriptBuilder, fixed_time};

    fn cue(name: &str) -> Event {
        Event::new("cue_signaled").with("cue", name)
    }

    fn emitted_cues(result: &KernelResult) -> Vec<String> {
        result
            .instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::EmitEvent { event } => event.get_str("cue").map(str::to_owned),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_event_loop_terminates_with_each_trigger_firing_once() {
        let script = ScriptBuilder::sample()
            .with("cues", json!({"name": "echo", "title": "Echo"}))
            .trigger(json!({
                "name": "ping",
                "event": {"type": "cue_signaled", "cue": "bell"},
                "actions": [{"name": "signal_cue", "cue_name": "echo"}]
            }))
            .trigger(json!({
                "name": "pong",
                "event": {"type": "cue_signaled", "cue": "echo"},
                "actions": [{"name": "signal_cue", "cue_name": "bell"}]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());

        let result = kernel.process_event(&cue("bell"), &ContextBuilder::new().build());

        assert_eq!(emitted_cues(&result), vec!["echo", "bell"]);
        let histories: Vec<&Instruction> = result
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::UpdateTripHistory { .. }))
            .collect();
        assert_eq!(histories.len(), 2);
    }

    #[test]
    fn test_later_actions_observe_earlier_effects() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "count",
                "event": {"type": "cue_signaled", "cue": "bell"},
                "actions": [
                    {"name": "increment_value", "value_ref": "rings"},
                    {"name": "increment_value", "value_ref": "rings"},
                    {"name": "log", "level": "info", "message": "rang {{rings}} times"}
                ]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());

        let result = kernel.process_event(&cue("bell"), &ContextBuilder::new().value("rings", 1).build());

        assert_eq!(result.instructions.last(), Some(&Instruction::log(LogLevel::Info, "rang 3 times")));
    }

    #[test]
    fn test_actions_after_wait_are_scheduled_with_accumulated_time() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "knock",
                "event": {"type": "cue_signaled", "cue": "bell"},
                "actions": [
                    {"name": "set_value", "value_ref": "door", "new_value_ref": "\"knocked\""},
                    {"name": "wait", "duration": "10m"},
                    {"name": "set_value", "value_ref": "door", "new_value_ref": "\"opened\""},
                    {"name": "wait", "duration": "5m"},
                    {"name": "signal_cue", "cue_name": "bell"}
                ]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());

        let result = kernel.process_event(&cue("bell"), &ContextBuilder::new().build());

        assert_eq!(
            result.instructions[1..],
            [
                Instruction::UpdateTripValues {
                    values: json!({"door": "knocked"}).as_object().cloned().unwrap()
                },
                Instruction::WaitUntil {
                    until: fixed_time() + TimeDelta::minutes(10)
                },
            ]
        );
        let schedule: Vec<(&str, DateTime<Utc>)> = result
            .scheduled_actions
            .iter()
            .map(|action| (action.name.as_str(), action.scheduled_at))
            .collect();
        assert_eq!(
            schedule,
            vec![
                ("set_value", fixed_time() + TimeDelta::minutes(10)),
                ("signal_cue", fixed_time() + TimeDelta::minutes(15)),
            ]
        );
        assert_eq!(result.scheduled_actions[0].trigger_name, "knock");
    }

    #[test]
    fn test_unreachable_wait_logs_error_instead_of_scheduling() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "eternity",
                "event": {"type": "cue_signaled", "cue": "bell"},
                "actions": [
                    {"name": "wait", "duration": "9999999999h"},
                    {"name": "log", "level": "info", "message": "still here"}
                ]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());

        let result = kernel.process_event(&cue("bell"), &ContextBuilder::new().build());

        assert_eq!(
            result.instructions[1..],
            [
                Instruction::error("Invalid wait duration \"9999999999h\"."),
                Instruction::log(LogLevel::Info, "still here"),
            ]
        );
        assert!(result.scheduled_actions.is_empty());
    }

    #[test]
    fn test_scheduled_action_cascades_into_emitted_events() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "answer",
                "event": {"type": "cue_signaled", "cue": "bell"},
                "actions": [{"name": "set_value", "value_ref": "answered", "new_value_ref": true}]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());
        let action = ScheduledAction {
            name: "signal_cue".to_owned(),
            params: json!({"cue_name": "bell"}).as_object().cloned().unwrap(),
            trigger_name: "knock".to_owned(),
            event: None,
            scheduled_at: fixed_time(),
        };

        let result = kernel.process_scheduled_action(&action, &ContextBuilder::new().build());

        assert_eq!(result.instructions.len(), 3);
        assert_eq!(
            result.instructions[2],
            Instruction::UpdateTripValues {
                values: json!({"answered": true}).as_object().cloned().unwrap()
            }
        );
    }

    #[test]
    fn test_time_trigger_fires_once() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "dinner_bell",
                "event": {"type": "time_occurred", "time": "dinner"},
                "actions": [{"name": "signal_cue", "cue_name": "bell"}]
            }))
            .build();
        let kernel = Kernel::new(registry(), &script, fixed_time());
        let event = Event::new("time_occurred").with("timestamp", fixed_time().timestamp());
        let fresh = ContextBuilder::new().scheduled("dinner", fixed_time()).build();
        let already = ContextBuilder::new()
            .scheduled("dinner", fixed_time())
            .fired("dinner_bell", fixed_time())
            .build();

        assert!(!kernel.process_event(&event, &fresh).instructions.is_empty());
        assert!(kernel.process_event(&event, &already).instructions.is_empty());
    }
}
