use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_json, parse_headers};
use crate::cli::OutputFormat;
use crate::client::{RequestDirectory, ScimClient};
use crate::config::AppConfig;
use crate::scim::{FetchMembers, MembershipResolver};

#[derive(Args)]
pub struct MembersArgs {
    #[arg(help = "Group path, e.g. /tenant-id/scim/v2/Groups/group-id")]
    pub path: String,

    #[arg(long = "header", help = "Header sent with directory queries, as name:value (repeatable)")]
    pub headers: Vec<String>,
}

pub async fn handle(args: MembersArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let client = ScimClient::new(&config)?;
    let headers = parse_headers(&args.headers)?;

    let resolver = MembershipResolver::new(RequestDirectory::new(client, headers));
    let members = resolver
        .fetch_members(&args.path)
        .await?
        .ok_or_else(|| anyhow::anyhow!("'{}' does not address a SCIM group", args.path))?;

    match output_format {
        OutputFormat::Json => output_json(
            &output_format,
            &json!({
                "group": args.path,
                "count": members.len(),
                "members": members,
            }),
        ),
        OutputFormat::Text => {
            if members.is_empty() {
                println!("No members found");
            }
            for member in &members {
                println!("{}", member.user_id);
            }
            Ok(())
        }
    }
}
