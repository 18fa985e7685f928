use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use chainwatch_document::to_json_string;
use chainwatch_model::{
    ChainedAlertTriggerRunResult, QueryLevelTriggerRunResult, TriggerRunResult,
};
use chainwatch_stream::read_file;

use crate::ResultKind;
use crate::config::ChainwatchConfig;

pub fn handle(file: &Path, kind: ResultKind, config: &ChainwatchConfig) -> Result<()> {
    let report = match kind {
        ResultKind::Chained => {
            let mut result: ChainedAlertTriggerRunResult = read_file(file, config.codec)
                .with_context(|| format!("Failed to load chained result {}", file.display()))?;
            let mut alert_ids: Vec<&String> = result.associated_alert_ids().iter().collect();
            alert_ids.sort();
            let alert_ids = json!(alert_ids);
            build_report(&mut result, config, Some(alert_ids))?
        }
        ResultKind::Query => {
            let mut result: QueryLevelTriggerRunResult = read_file(file, config.codec)
                .with_context(|| format!("Failed to load query-level result {}", file.display()))?;
            build_report(&mut result, config, None)?
        }
    };

    println!("{}", to_json_string(&report, &config.output)?);
    Ok(())
}

fn build_report(
    result: &mut dyn TriggerRunResult,
    config: &ChainwatchConfig,
    associated_alert_ids: Option<serde_json::Value>,
) -> Result<serde_json::Value> {
    let alert_error = result.alert_error();
    if let Some(err) = &alert_error {
        tracing::warn!("Trigger '{}' reported a failure", result.trigger_name());
        tracing::debug!("{}", err.message);
    }
    let document = result.to_document_value(&config.output)?;

    let mut report = json!({ "result": document });
    if let Some(ids) = associated_alert_ids {
        report["associated_alert_ids"] = ids;
    }
    report["alert_error"] = json!(alert_error);
    Ok(report)
}
