use std::path::PathBuf;

use clap::Args;

use crate::cli::utils::{output_json, read_json_body};
use crate::cli::OutputFormat;
use crate::scim::{normalize, HeaderBag, MutationRequest, ScimMethod, StaticMembers};

#[derive(Args)]
pub struct NormalizeArgs {
    #[arg(help = "HTTP method (get, post, patch, put, delete)")]
    pub method: String,

    #[arg(help = "Request path, e.g. /tenant-id/scim/v2/Groups/group-id")]
    pub path: String,

    #[arg(long, help = "JSON body file, '-' reads stdin")]
    pub body: Option<PathBuf>,

    #[arg(long = "member", help = "Current member id of the addressed group (repeatable)")]
    pub members: Vec<String>,
}

pub async fn handle(args: NormalizeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let method = ScimMethod::from_http(&args.method).ok_or_else(|| {
        anyhow::anyhow!("Method '{}' is not one of {}", args.method, ScimMethod::allow_header())
    })?;

    let body = args.body.as_deref().map(read_json_body).transpose()?;
    let request = MutationRequest::new(method, HeaderBag::new(), args.path, body);

    let fetch = StaticMembers::new(args.members);
    let normalized = normalize(&request, &fetch).await?;

    match output_format {
        OutputFormat::Json => output_json(&output_format, &serde_json::to_value(&normalized)?),
        OutputFormat::Text => {
            println!("{} {}", normalized.method.as_str().to_uppercase(), normalized.path);
            if normalized.operations().is_empty() {
                if let Some(data) = normalized.data_value()? {
                    output_json(&output_format, &data)?;
                }
            }
            for operation in normalized.operations() {
                let path = operation.path.as_deref().unwrap_or("-");
                println!(
                    "  {:<8} {:<24} {}",
                    operation.op.as_str(),
                    path,
                    serde_json::to_string(&operation.value)?
                );
            }
            Ok(())
        }
    }
}
