use std::collections::HashSet;

use chainwatch_document::{DocumentBuilder, DocumentParams};
use chainwatch_stream::{Readable, StreamInput, StreamOutput, Writeable};
use chainwatch_types::{AlertError, ErrorValue, Result};

use crate::action::ActionRunResult;
use crate::action_results::ActionResults;
use crate::trigger::{
    TriggerRunResult, aggregate_alert_error, normalize_error, read_header,
    write_action_results_document, write_header,
};

/// Result of evaluating a chained alert trigger, which may link to alerts
/// raised earlier by related monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainedAlertTriggerRunResult {
    trigger_name: String,
    triggered: bool,
    error: Option<ErrorValue>,
    action_results: ActionResults,
    associated_alert_ids: HashSet<String>,
}

impl ChainedAlertTriggerRunResult {
    pub fn new<I, S>(
        trigger_name: impl Into<String>,
        triggered: bool,
        error: Option<ErrorValue>,
        associated_alert_ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trigger_name: trigger_name.into(),
            triggered,
            error,
            action_results: ActionResults::new(),
            associated_alert_ids: associated_alert_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_action_results(mut self, action_results: ActionResults) -> Self {
        self.action_results = action_results;
        self
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn action_results(&self) -> &ActionResults {
        &self.action_results
    }

    pub fn associated_alert_ids(&self) -> &HashSet<String> {
        &self.associated_alert_ids
    }

    /// Records the outcome of an action as it completes.
    pub fn add_action_result(
        &mut self,
        action_id: impl Into<String>,
        result: ActionRunResult,
    ) -> Option<ActionRunResult> {
        self.action_results.insert(action_id, result)
    }
}

impl TriggerRunResult for ChainedAlertTriggerRunResult {
    fn trigger_name(&self) -> &str {
        &self.trigger_name
    }

    fn error(&self) -> Option<&ErrorValue> {
        self.error.as_ref()
    }

    fn alert_error(&self) -> Option<AlertError> {
        aggregate_alert_error(self.error.as_ref(), &self.action_results)
    }

    fn internal_document(
        &mut self,
        builder: &mut DocumentBuilder,
        params: &DocumentParams,
    ) -> Result<()> {
        normalize_error(&mut self.error);
        write_action_results_document(builder, self.triggered, &self.action_results, params)
    }
}

impl Writeable for ChainedAlertTriggerRunResult {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()> {
        write_header(out, &self.trigger_name, self.error.as_ref())?;
        out.write_bool(self.triggered);
        self.action_results.write_to(out)?;
        out.write_string_collection(&self.associated_alert_ids)
    }
}

impl Readable for ChainedAlertTriggerRunResult {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self> {
        let (trigger_name, error) = read_header(input)?;
        let triggered = input.read_bool()?;
        let action_results = ActionResults::read_from(input)?;
        let associated_alert_ids = input.read_string_set()?;
        tracing::debug!(
            "Decoded chained trigger result '{}' with {} actions, {} associated alerts",
            trigger_name,
            action_results.len(),
            associated_alert_ids.len()
        );
        Ok(Self {
            trigger_name,
            triggered,
            error,
            action_results,
            associated_alert_ids,
        })
    }
}
