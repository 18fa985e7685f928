use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of script stack lines rendered into a user-facing message.
pub const SCRIPT_STACK_LIMIT: usize = 100;

const UNKNOWN_INTERNAL_ERROR: &str = "Unknown Internal error. See the logs for details.";

/// Location of a script failure within the script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptPosition {
    pub offset: u32,
    pub start: u32,
    pub end: u32,
}

/// Structured detail attached to a failure raised while running a user script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptError {
    /// Script stack lines, innermost first.
    pub script_stack: Vec<String>,
    pub script: String,
    pub lang: String,
    pub position: Option<ScriptPosition>,
}

impl ScriptError {
    pub fn new(script: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            script_stack: Vec::new(),
            script: script.into(),
            lang: lang.into(),
            position: None,
        }
    }

    pub fn with_stack<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_stack = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_position(mut self, position: ScriptPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Script stack joined by newlines, truncated to [`SCRIPT_STACK_LIMIT`] lines.
    pub fn stack_message(&self) -> String {
        let mut lines: Vec<&str> = self
            .script_stack
            .iter()
            .take(SCRIPT_STACK_LIMIT)
            .map(String::as_str)
            .collect();
        if self.script_stack.len() > SCRIPT_STACK_LIMIT {
            lines.push("...");
        }
        lines.join("\n")
    }
}

/// Which kind of failure an [`ErrorValue`] describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Generic,
    Script(ScriptError),
}

/// A failure captured during trigger evaluation or action execution.
///
/// Only the kind, message and cause chain are kept; the failure's original
/// type is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub message: Option<String>,
    pub cause: Option<Box<ErrorValue>>,
}

impl ErrorValue {
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Generic,
            message: Some(message.into()),
            cause: None,
        }
    }

    /// A generic failure that carries no message.
    pub fn unknown() -> Self {
        Self {
            kind: ErrorKind::Generic,
            message: None,
            cause: None,
        }
    }

    pub fn script(message: impl Into<String>, script: ScriptError) -> Self {
        Self {
            kind: ErrorKind::Script(script),
            message: Some(message.into()),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: ErrorValue) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&ErrorValue> {
        self.cause.as_deref()
    }

    pub fn script_error(&self) -> Option<&ScriptError> {
        match &self.kind {
            ErrorKind::Script(script) => Some(script),
            ErrorKind::Generic => None,
        }
    }

    pub fn is_script(&self) -> bool {
        self.script_error().is_some()
    }

    /// Number of errors in the cause chain, including this one.
    pub fn depth(&self) -> usize {
        1 + self.cause().map_or(0, ErrorValue::depth)
    }

    /// Message shown to users in alert history and notifications.
    pub fn user_error_message(&self) -> String {
        match (&self.kind, self.message()) {
            (ErrorKind::Script(script), _) => script.stack_message(),
            (ErrorKind::Generic, Some(msg)) => {
                tracing::info!("Internal error: {}. See the logs for details", msg);
                msg.to_string()
            }
            (ErrorKind::Generic, None) => {
                tracing::info!("{}", UNKNOWN_INTERNAL_ERROR);
                UNKNOWN_INTERNAL_ERROR.to_string()
            }
        }
    }

    /// Structured JSON form, including the cause chain under `caused_by`.
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        match &self.kind {
            ErrorKind::Generic => {
                obj.insert("type".into(), "exception".into());
                obj.insert("reason".into(), self.message().into());
            }
            ErrorKind::Script(script) => {
                obj.insert("type".into(), "script_exception".into());
                obj.insert("reason".into(), self.message().into());
                obj.insert("script_stack".into(), script.script_stack.clone().into());
                obj.insert("script".into(), script.script.clone().into());
                obj.insert("lang".into(), script.lang.clone().into());
                if let Some(pos) = script.position {
                    obj.insert(
                        "position".into(),
                        serde_json::json!({
                            "offset": pos.offset,
                            "start": pos.start,
                            "end": pos.end,
                        }),
                    );
                }
            }
        }
        if let Some(cause) = self.cause() {
            obj.insert("caused_by".into(), cause.to_json_value());
        }
        serde_json::Value::Object(obj)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Script failures become a generic error whose message is the script's
    /// JSON rendering, with the original kept as the cause. Returns `None`
    /// for anything already generic.
    pub fn normalized(&self) -> Option<ErrorValue> {
        if !self.is_script() {
            return None;
        }
        Some(ErrorValue::generic(self.to_json_string()).with_cause(self.clone()))
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for ErrorValue {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
