//! `peerlink check` - build a session end to end and report it.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use peerlink::{OperationKind, Session};
use serde::Serialize;

use super::Context;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct SessionSummary {
    msp_id: String,
    subject: String,
    not_after: DateTime<Utc>,
    signer: String,
    endpoint: String,
    authority: String,
    protocol: Option<String>,
    timeouts: Vec<(OperationKind, u64)>,
}

impl SessionSummary {
    fn from_session(session: &Session) -> Self {
        let certificate = session.identity().certificate();
        let channel = session.channel();
        Self {
            msp_id: session.identity().msp_id().to_string(),
            subject: certificate.subject().to_string(),
            not_after: certificate.not_after(),
            signer: session.signer().algorithm().to_string(),
            endpoint: channel.endpoint().to_string(),
            authority: channel.authority().to_string(),
            protocol: channel
                .negotiated_protocol()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
            timeouts: OperationKind::ALL
                .iter()
                .map(|&kind| (kind, session.deadline(kind).as_secs()))
                .collect(),
        }
    }
}

pub async fn execute(ctx: Context) -> Result<()> {
    let config = ctx.config()?;
    let session = Session::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.peer_endpoint))?;

    let summary = SessionSummary::from_session(&session);
    session.close().await?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Pretty => print_summary_pretty(&summary),
    }
    Ok(())
}

fn print_summary_pretty(summary: &SessionSummary) {
    println!("{} {}", "Session OK:".green().bold(), summary.endpoint.cyan());
    println!();

    println!("  {} {}", "MSP ID:".bold(), summary.msp_id);
    println!("  {} {}", "Subject:".bold(), summary.subject);
    let expiry = summary.not_after.to_rfc3339();
    if summary.not_after < Utc::now() {
        println!("  {} {} {}", "Expires:".bold(), expiry, "(expired)".red());
    } else {
        println!("  {} {}", "Expires:".bold(), expiry);
    }
    println!("  {} {}", "Signer:".bold(), summary.signer);
    println!("  {} {}", "Authority:".bold(), summary.authority);
    println!(
        "  {} {}",
        "Protocol:".bold(),
        summary.protocol.as_deref().unwrap_or("(none)")
    );

    println!();
    println!("{}", "Timeouts:".bold());
    for (kind, secs) in &summary.timeouts {
        println!("  {:<15} {}s", kind.to_string(), secs);
    }
}
