use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use chainwatch_document::{DocumentBuilder, DocumentParams, ToDocument};
use chainwatch_stream::{Readable, StreamInput, StreamOutput, Writeable};
use chainwatch_types::{ErrorValue, Result};

/// Outcome of executing one action tied to a fired trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRunResult {
    pub action_id: String,
    pub action_name: String,
    /// Rendered action outputs, e.g. message subject and body.
    pub output: BTreeMap<String, String>,
    pub throttled: bool,
    pub execution_time: Option<DateTime<Utc>>,
    pub error: Option<ErrorValue>,
}

impl ActionRunResult {
    pub fn new(action_id: impl Into<String>, action_name: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            action_name: action_name.into(),
            output: BTreeMap::new(),
            throttled: false,
            execution_time: None,
            error: None,
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.output.insert(key.into(), value.into());
        self
    }

    pub fn with_throttled(mut self, throttled: bool) -> Self {
        self.throttled = throttled;
        self
    }

    pub fn with_execution_time(mut self, at: DateTime<Utc>) -> Self {
        self.execution_time = Some(at);
        self
    }

    pub fn with_error(mut self, error: ErrorValue) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl ToDocument for ActionRunResult {
    fn to_document(&self, builder: &mut DocumentBuilder, params: &DocumentParams) -> Result<()> {
        builder
            .start_object()?
            .field("id", self.action_id.as_str())?
            .field("name", self.action_name.as_str())?;

        let output: serde_json::Map<String, serde_json::Value> = self
            .output
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v.as_str())))
            .collect();
        builder
            .field("output", output)?
            .field("throttled", self.throttled)?
            .optional_field(
                "execution_time",
                self.execution_time.map(|t| t.timestamp_millis()),
                params,
            )?
            .optional_field(
                "error",
                self.error.as_ref().map(ErrorValue::user_error_message),
                params,
            )?
            .end_object()?;
        Ok(())
    }
}

impl Writeable for ActionRunResult {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()> {
        out.write_string(&self.action_id)?;
        out.write_string(&self.action_name)?;
        out.write_map(self.output.iter().map(|(k, v)| (k.as_str(), v)))?;
        out.write_bool(self.throttled);
        out.write_optional_instant(self.execution_time);
        out.write_optional_error(self.error.as_ref())
    }
}

impl Readable for ActionRunResult {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self> {
        Ok(Self {
            action_id: input.read_string()?,
            action_name: input.read_string()?,
            output: input.read_map::<String>()?.into_iter().collect(),
            throttled: input.read_bool()?,
            execution_time: input.read_optional_instant()?,
            error: input.read_optional_error()?,
        })
    }
}
