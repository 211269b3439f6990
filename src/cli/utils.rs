use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::OutputFormat;
use crate::views::{Confirm, Notice};

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

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
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

/// Error to return from a command. JSON output also gets an error document on
/// stdout; the binary prints the message to stderr either way.
pub fn command_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Error {
    if let OutputFormat::Json = output_format {
        if let Err(e) = output_error(output_format, message, error_code) {
            tracing::warn!(error = %e, "failed to write error document");
        }
    }
    anyhow::anyhow!("{}", message)
}

/// Report a notice; error notices also fail the command
pub fn output_notice(output_format: &OutputFormat, notice: &Notice) -> anyhow::Result<()> {
    if notice.is_error() {
        return Err(command_error(output_format, &notice.message, None));
    }
    output_success(output_format, &notice.message, None)
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads one line from stdin after printing `prompt` to stderr
pub async fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(prompt.as_bytes()).await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Use the provided value or ask for it. Input is not masked.
pub async fn value_or_prompt(provided: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match provided {
        Some(value) => Ok(value),
        None => prompt_line(prompt).await,
    }
}

/// y/N question on the terminal
pub struct StdinConfirm;

#[async_trait::async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        match prompt_line(&format!("{} [y/N] ", prompt)).await {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!(error = %e, "could not read confirmation; treating as no");
                false
            }
        }
    }
}
