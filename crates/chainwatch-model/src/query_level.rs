use chainwatch_document::{DocumentBuilder, DocumentParams};
use chainwatch_stream::{Readable, StreamInput, StreamOutput, Writeable};
use chainwatch_types::{AlertError, ErrorValue, Result};

use crate::action::ActionRunResult;
use crate::action_results::ActionResults;
use crate::trigger::{
    TriggerRunResult, aggregate_alert_error, normalize_error, read_header,
    write_action_results_document, write_header,
};

/// Result of evaluating a single query-level trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLevelTriggerRunResult {
    trigger_name: String,
    triggered: bool,
    error: Option<ErrorValue>,
    action_results: ActionResults,
}

impl QueryLevelTriggerRunResult {
    pub fn new(
        trigger_name: impl Into<String>,
        triggered: bool,
        error: Option<ErrorValue>,
    ) -> Self {
        Self {
            trigger_name: trigger_name.into(),
            triggered,
            error,
            action_results: ActionResults::new(),
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

    pub fn add_action_result(
        &mut self,
        action_id: impl Into<String>,
        result: ActionRunResult,
    ) -> Option<ActionRunResult> {
        self.action_results.insert(action_id, result)
    }
}

impl TriggerRunResult for QueryLevelTriggerRunResult {
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

impl Writeable for QueryLevelTriggerRunResult {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()> {
        write_header(out, &self.trigger_name, self.error.as_ref())?;
        out.write_bool(self.triggered);
        self.action_results.write_to(out)
    }
}

impl Readable for QueryLevelTriggerRunResult {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self> {
        let (trigger_name, error) = read_header(input)?;
        Ok(Self {
            trigger_name,
            error,
            triggered: input.read_bool()?,
            action_results: ActionResults::read_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_stream::{from_bytes, to_bytes};

    #[test]
    fn test_query_level_roundtrip() {
        let mut result = QueryLevelTriggerRunResult::new("high-latency", true, None);
        result.add_action_result(
            "a1",
            ActionRunResult::new("a1", "email").with_output("subject", "p99 > 2s"),
        );
        let bytes = to_bytes(&result).unwrap();
        let decoded: QueryLevelTriggerRunResult = from_bytes(&bytes).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_query_level_document_has_no_associated_alerts() {
        let mut result = QueryLevelTriggerRunResult::new("high-latency", false, None);
        let doc = result.to_document_value(&DocumentParams::default()).unwrap();
        assert!(doc.get("associated_alert_ids").is_none());
        assert_eq!(doc["triggered"], false);
    }

    #[test]
    fn test_query_level_action_error() {
        let mut result = QueryLevelTriggerRunResult::new("t", true, None);
        result.add_action_result(
            "a1",
            ActionRunResult::new("a1", "webhook").with_error(ErrorValue::generic("timeout")),
        );
        assert_eq!(
            result.alert_error().unwrap().message,
            "Failed running action:\ntimeout"
        );
    }

    #[test]
    fn test_empty_name_rejected_on_decode() {
        let result = QueryLevelTriggerRunResult::new("", true, None);
        let bytes = to_bytes(&result).unwrap();
        let err = from_bytes::<QueryLevelTriggerRunResult>(&bytes).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_truncated_error_fails() {
        let result =
            QueryLevelTriggerRunResult::new("t", false, Some(ErrorValue::generic("no such index")));
        let bytes = to_bytes(&result).unwrap();

        // name(2) + error flag(1) + tag(1) stops inside the error message
        let err = from_bytes::<QueryLevelTriggerRunResult>(&bytes[..5]).unwrap_err();
        assert!(err.is_decode());
    }
}
