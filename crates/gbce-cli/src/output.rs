use std::io::{self, Write};

use gbce_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_envelope(&mut out, envelope, format, pretty)?;
    out.flush()?;
    Ok(())
}

pub fn write_envelope(
    out: &mut impl Write,
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => write_table(out, envelope)?,
    }

    Ok(())
}

fn write_table(out: &mut impl Write, envelope: &Envelope<Value>) -> Result<(), CliError> {
    writeln!(out, "transaction_id: {}", envelope.meta.transaction_id)?;
    writeln!(out, "schema        : {}", envelope.meta.schema_version)?;
    writeln!(out, "generated_at  : {}", envelope.meta.generated_at)?;
    writeln!(out, "latency_ms    : {}", envelope.meta.latency_ms)?;

    if !envelope.meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    if !envelope.data.is_null() {
        writeln!(out, "data:")?;
        let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
        for line in pretty_data.lines() {
            writeln!(out, "  {line}")?;
        }
    }

    if !envelope.errors.is_empty() {
        writeln!(out, "errors:")?;
        for error in &envelope.errors {
            writeln!(out, "  - {}: {}", error.code, error.message)?;
        }
    }

    Ok(())
}
