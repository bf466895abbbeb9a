//! `peerlink sign` - sign a digest with a keystore key.

use anyhow::{Context as _, Result};
use colored::Colorize;
use peerlink::{load_signer_with, KeySelection};
use serde::Serialize;

use super::Context;
use crate::cli::args::SignArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct SignOutput {
    algorithm: String,
    digest: String,
    signature: String,
}

pub async fn execute(ctx: Context, args: SignArgs) -> Result<()> {
    let digest = decode_digest(&args.digest)?;

    let key_dir = match args.key_dir {
        Some(dir) => dir,
        None => ctx.config()?.key_directory_path(),
    };
    let selection = if args.require_single {
        KeySelection::RequireSingle
    } else {
        KeySelection::FirstByName
    };

    let signer = load_signer_with(&key_dir, selection)
        .await
        .with_context(|| format!("loading key from {}", key_dir.display()))?;
    let signature = signer.sign(&digest)?;

    let output = SignOutput {
        algorithm: signer.algorithm().to_string(),
        digest: hex::encode(&digest),
        signature: hex::encode(&signature),
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Pretty => {
            if ctx.verbose {
                println!("{} {}", "Algorithm:".bold(), output.algorithm);
            }
            println!("{}", output.signature);
        }
    }
    Ok(())
}

/// Decode a hex digest, tolerating a `0x` prefix and surrounding whitespace.
fn decode_digest(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let digest = hex::decode(hex_str).context("digest must be hex-encoded")?;
    if digest.is_empty() {
        anyhow::bail!("digest must not be empty");
    }
    Ok(digest)
}
