use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::scim::HeaderBag;

/// Read a JSON body from `path`, or from stdin when the path is `-`
pub fn read_json_body(path: &Path) -> anyhow::Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?
    };

    Ok(serde_json::from_str(&content)?)
}

/// Parse repeated `--header name:value` flags
pub fn parse_headers(raw: &[String]) -> anyhow::Result<HeaderBag> {
    raw.iter()
        .map(|header| {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Header '{}' must look like name:value", header))?;
            Ok((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

/// Print a JSON document, pretty in JSON mode and compact otherwise
pub fn output_json(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}
