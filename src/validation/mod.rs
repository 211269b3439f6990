//! Client-side checks run before any upload request.
//!
//! These are advisory: the backend remains the authority and may reject a
//! file that passes here. A failure, however, always stops the upload.

use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Column every uploaded CSV must carry
pub const REQUIRED_COLUMN: &str = "Review Text";

// A header record larger than this is treated as unparseable
const MAX_HEADER_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Validation Failed: CSV must contain a '{column}' column.")]
    MissingColumn { column: String },

    #[error("Failed to parse CSV file.")]
    Unparseable { reason: String },

    #[error("File must be in .csv format.")]
    NotCsv { filename: String },

    #[error("Filename can only contain letters, numbers, dots, underscores, and hyphens.")]
    InvalidFilename { filename: String },
}

/// Name checks shown to users as upload requirements
pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.is_empty()
        || !filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFilename {
            filename: filename.to_string(),
        });
    }

    let has_csv_extension = filename
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !has_csv_extension {
        return Err(ValidationError::NotCsv {
            filename: filename.to_string(),
        });
    }

    Ok(())
}

/// Opens `path` and checks its header row only; the rest of the file is never read
pub async fn validate_csv_file(path: &Path) -> Result<Vec<String>, ValidationError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ValidationError::Unparseable {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
    validate_csv_header(BufReader::new(file)).await
}

/// Parses the header record from `reader` and requires `REQUIRED_COLUMN`.
/// Returns the parsed column names.
pub async fn validate_csv_header<R>(reader: R) -> Result<Vec<String>, ValidationError>
where
    R: AsyncBufRead + Unpin,
{
    let columns = read_header(reader).await?;
    if columns.iter().any(|c| c == REQUIRED_COLUMN) {
        tracing::debug!(?columns, "csv header accepted");
        Ok(columns)
    } else {
        tracing::debug!(?columns, "csv header rejected");
        Err(ValidationError::MissingColumn {
            column: REQUIRED_COLUMN.to_string(),
        })
    }
}

/// Reads one CSV record, following quoted fields across line breaks.
/// Nothing past the end of that record is consumed.
pub async fn read_header<R>(mut reader: R) -> Result<Vec<String>, ValidationError>
where
    R: AsyncBufRead + Unpin,
{
    let mut record: Vec<u8> = Vec::new();

    loop {
        let read = reader
            .read_until(b'\n', &mut record)
            .await
            .map_err(|e| ValidationError::Unparseable { reason: e.to_string() })?;

        let text = std::str::from_utf8(&record).map_err(|e| ValidationError::Unparseable {
            reason: format!("header is not valid UTF-8: {}", e),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let line = text.trim_end_matches(['\r', '\n']);

        let (fields, open_quote) = scan_record(line);
        if !open_quote {
            if line.trim().is_empty() {
                return Err(ValidationError::Unparseable {
                    reason: "file has no header row".to_string(),
                });
            }
            return Ok(fields);
        }
        if read == 0 {
            return Err(ValidationError::Unparseable {
                reason: "unterminated quoted field in header".to_string(),
            });
        }
        if record.len() > MAX_HEADER_BYTES {
            return Err(ValidationError::Unparseable {
                reason: "header row exceeds size limit".to_string(),
            });
        }
    }
}

/// Splits one CSV record into fields, honouring quotes and `""` escapes.
/// A quote opens a quoted field only as the first character of a field.
pub fn parse_csv_row(line: &str) -> Vec<String> {
    scan_record(line).0
}

// Second value is true when the record ends inside a quoted field
fn scan_record(line: &str) -> (Vec<String>, bool) {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current_field.push(c);
            }
            continue;
        }

        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            ',' => {
                result.push(std::mem::take(&mut current_field));
                field_start = true;
            }
            _ => {
                current_field.push(c);
                field_start = false;
            }
        }
    }

    result.push(current_field);
    (result, in_quotes)
}
