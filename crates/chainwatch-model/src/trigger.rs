use chainwatch_document::{DocumentBuilder, DocumentParams};
use chainwatch_stream::{StreamInput, StreamOutput, Writeable};
use chainwatch_types::{AlertError, ChainwatchError, ErrorValue, Result};

use crate::action_results::ActionResults;

pub const TRIGGER_ERROR_PREFIX: &str = "Failed evaluating trigger:\n";
pub const ACTION_ERROR_PREFIX: &str = "Failed running action:\n";

/// Outcome of evaluating one trigger during a monitor run.
pub trait TriggerRunResult: Writeable {
    fn trigger_name(&self) -> &str;

    /// Failure raised while evaluating the trigger itself.
    fn error(&self) -> Option<&ErrorValue>;

    /// Single failure summary for this evaluation, if anything failed.
    fn alert_error(&self) -> Option<AlertError>;

    /// Writes this variant's own fields into the already-open result object.
    fn internal_document(
        &mut self,
        builder: &mut DocumentBuilder,
        params: &DocumentParams,
    ) -> Result<()>;

    /// Writes the complete result object: `name`, the variant fields, then `error`.
    fn to_document(
        &mut self,
        builder: &mut DocumentBuilder,
        params: &DocumentParams,
    ) -> Result<()> {
        builder.start_object()?.field("name", self.trigger_name())?;
        self.internal_document(builder, params)?;
        let message = self.error().and_then(ErrorValue::message).map(str::to_owned);
        builder.optional_field("error", message, params)?.end_object()?;
        Ok(())
    }

    fn to_document_value(&mut self, params: &DocumentParams) -> Result<serde_json::Value> {
        let mut builder = DocumentBuilder::new();
        self.to_document(&mut builder, params)?;
        builder.build()
    }
}

/// Trigger errors win over action errors; among actions the first failure in
/// insertion order is reported and later ones are dropped.
pub fn aggregate_alert_error(
    error: Option<&ErrorValue>,
    action_results: &ActionResults,
) -> Option<AlertError> {
    if let Some(err) = error {
        return Some(AlertError::now(format!(
            "{TRIGGER_ERROR_PREFIX}{}",
            err.user_error_message()
        )));
    }
    let mut failures = action_results.failures();
    let first = failures.next()?;
    let suppressed = failures.count();
    if suppressed > 0 {
        tracing::debug!(
            "{} later action failures not included in alert error",
            suppressed
        );
    }
    let err = first.error.as_ref()?;
    Some(AlertError::now(format!(
        "{ACTION_ERROR_PREFIX}{}",
        err.user_error_message()
    )))
}

/// Replaces a script failure with its generic JSON rendering. A no-op once
/// normalized.
pub fn normalize_error(error: &mut Option<ErrorValue>) {
    if let Some(normalized) = error.as_ref().and_then(ErrorValue::normalized) {
        *error = Some(normalized);
    }
}

pub fn write_action_results_document(
    builder: &mut DocumentBuilder,
    triggered: bool,
    action_results: &ActionResults,
    params: &DocumentParams,
) -> Result<()> {
    builder
        .field("triggered", triggered)?
        .map_field("action_results", action_results.iter(), params)?;
    Ok(())
}

/// Writes the fields shared by every trigger result: name, then error.
pub fn write_header(
    out: &mut StreamOutput,
    trigger_name: &str,
    error: Option<&ErrorValue>,
) -> Result<()> {
    out.write_string(trigger_name)?;
    out.write_optional_error(error)
}

pub fn read_header(input: &mut StreamInput<'_>) -> Result<(String, Option<ErrorValue>)> {
    let trigger_name = input.read_string()?;
    if trigger_name.is_empty() {
        return Err(ChainwatchError::decode("trigger name is empty"));
    }
    let error = input.read_optional_error()?;
    Ok((trigger_name, error))
}
