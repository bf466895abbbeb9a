//! `peerlink inspect` - show the details of a certificate.

use anyhow::{Context as _, Result};
use chrono::Utc;
use colored::Colorize;
use peerlink::CertificateMaterial;

use super::Context;
use crate::cli::args::InspectArgs;
use crate::output::{print_json, OutputFormat};

pub async fn execute(ctx: Context, args: InspectArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.cert)
        .await
        .with_context(|| format!("reading {}", args.cert.display()))?;
    let cert = CertificateMaterial::parse(&bytes, &args.cert.display().to_string())?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&cert)?,
        OutputFormat::Pretty => print_certificate_pretty(&cert),
    }
    Ok(())
}

fn print_certificate_pretty(cert: &CertificateMaterial) {
    println!("{} {}", "Certificate:".bold(), cert.subject().cyan().bold());
    println!();

    println!("  {} {}", "Issuer:".bold(), cert.issuer());
    if let Some(cn) = cert.common_name() {
        println!("  {} {}", "Common name:".bold(), cn);
    }
    if !cert.dns_names().is_empty() {
        println!("  {} {}", "DNS names:".bold(), cert.dns_names().join(", "));
    }
    println!("  {} {}", "Serial:".bold(), cert.serial());
    println!("  {} {}", "Key:".bold(), cert.key_algorithm());
    println!("  {} {}", "Not before:".bold(), cert.not_before().to_rfc3339());

    let not_after = cert.not_after().to_rfc3339();
    if cert.is_valid_at(Utc::now()) {
        println!("  {} {}", "Not after:".bold(), not_after);
    } else {
        println!("  {} {} {}", "Not after:".bold(), not_after, "(not currently valid)".red());
    }
    println!("  {} {}", "SHA-256:".bold(), cert.fingerprint().dimmed());
}
