//! `peerlink config` - show the effective configuration.

use anyhow::Result;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::{print_json, OutputFormat};

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&config),
        OutputFormat::Pretty => {
            if ctx.verbose && !ctx.config_path.exists() {
                println!("# {} not found, using defaults", ctx.config_path.display());
            }
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
