use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use chainwatch_model::{ActionRunResult, ChainedAlertTriggerRunResult};
use chainwatch_stream::write_file;
use chainwatch_types::{ErrorValue, ScriptError, ScriptPosition};

use crate::config::ChainwatchConfig;

pub struct SampleOptions {
    pub fail_action: bool,
    pub script_error: bool,
}

/// Builds a chained result resembling one produced by a real monitor run.
pub fn build_sample(options: &SampleOptions) -> ChainedAlertTriggerRunResult {
    let error = options.script_error.then(|| {
        ErrorValue::script(
            "compile error",
            ScriptError::new("ctx.results[0].hits.total.value >", "painless")
                .with_stack([
                    "ctx.results[0].hits.total.value >",
                    "                                 ^---- HERE",
                ])
                .with_position(ScriptPosition {
                    offset: 33,
                    start: 0,
                    end: 33,
                }),
        )
    });
    let alert_ids = (0..2).map(|_| Uuid::new_v4().to_string());
    let mut result =
        ChainedAlertTriggerRunResult::new("chained-trigger", error.is_none(), error, alert_ids);

    let now = Utc::now();
    let notify_id = Uuid::new_v4().to_string();
    result.add_action_result(
        notify_id.clone(),
        ActionRunResult::new(notify_id, "notify-oncall")
            .with_output("subject", "Chained alert fired")
            .with_output("message", "2 delegate monitors are in alert")
            .with_execution_time(now),
    );

    let webhook_id = Uuid::new_v4().to_string();
    let mut webhook = ActionRunResult::new(webhook_id.clone(), "incident-webhook")
        .with_execution_time(now);
    if options.fail_action {
        webhook = webhook.with_error(
            ErrorValue::generic("webhook returned HTTP 503")
                .with_cause(ErrorValue::generic("connection reset by peer")),
        );
    }
    result.add_action_result(webhook_id, webhook);
    result
}

pub fn handle(file: &Path, options: &SampleOptions, config: &ChainwatchConfig) -> Result<()> {
    let result = build_sample(options);
    let written = write_file(file, &result, config.codec)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    tracing::info!("Wrote {} byte sample to {}", written, file.display());
    println!("{}", file.display());
    Ok(())
}
