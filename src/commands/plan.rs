use anyhow::Result;
use ferry::config::PlanSettings;
use ferry::{ActionBatch, DeployOptions, FerryError};

/// Compile the actions and print them without connecting
pub fn cmd_plan(settings: &PlanSettings, json: bool) -> Result<bool> {
    let batch = settings.compile_actions().map_err(FerryError::from)?;
    let options = settings.options();

    if json {
        println!("{}", render_json(&batch, &options));
    } else {
        print!("{}", render_text(&batch, &options));
    }
    Ok(true)
}

pub fn render_text(batch: &ActionBatch, options: &DeployOptions) -> String {
    if batch.is_empty() {
        return "No actions.\n".to_string();
    }

    let mut out = String::new();
    for (index, operation) in batch.iter().enumerate() {
        out.push_str(&format!("{}. {}", index + 1, operation));
        if let Some(reason) = options.skip_reason(operation) {
            out.push_str(&format!("  (ignored: {})", reason));
        }
        out.push('\n');
    }
    out
}

pub fn render_json(batch: &ActionBatch, options: &DeployOptions) -> serde_json::Value {
    let operations: Vec<serde_json::Value> = batch
        .iter()
        .map(|operation| {
            let mut value = serde_json::to_value(operation).unwrap_or(serde_json::Value::Null);
            if let (Some(map), Some(reason)) =
                (value.as_object_mut(), options.skip_reason(operation))
            {
                map.insert("ignored".to_string(), serde_json::Value::from(reason));
            }
            value
        })
        .collect();

    serde_json::json!({
        "event": "plan",
        "command": "plan",
        "count": operations.len(),
        "operations": operations,
    })
}
