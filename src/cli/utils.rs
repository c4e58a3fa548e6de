use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::monitor::SessionTimeoutConfig;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output a timeout configuration in the appropriate format
pub fn output_config(
    output_format: &OutputFormat,
    message: &str,
    config: &SessionTimeoutConfig,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            output_success(output_format, message, Some(json!({ "config": config })))?;
        }
        OutputFormat::Text => {
            println!("{}", message);
            println!("Timeout:        {} min", config.timeout_minutes);
            println!("Warning:        {} min before timeout", config.warning_minutes);
            println!("Check interval: {} s", config.check_interval_seconds);
        }
    }
    Ok(())
}
