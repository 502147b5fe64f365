// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use footprint_app::{PageState, production_emissions, summary_rows};
use footprint_credentials::Client;
use runtime::{NetworkRuntime, OfflineRuntime};
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `footprint --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let asset_id = options
        .asset_id
        .clone()
        .unwrap_or_else(|| config.asset_id().to_owned());
    if asset_id.trim().is_empty() {
        bail!("--asset requires a non-empty asset id");
    }

    let log_path = config.log_file()?;
    logging::init(config.log_level(), &log_path)?;
    info!(
        config = %options.config_path.display(),
        base_url = config.base_url(),
        asset_id = %asset_id,
        offline = options.offline,
        "starting footprint"
    );

    let client = Client::new(config.base_url(), config.timeout()?, config.retry_policy()?)
        .with_context(|| {
            format!(
                "invalid [service] config in {}; fix base_url/timeout/retries values",
                options.config_path.display()
            )
        })?;

    if options.check_only {
        if !options.offline {
            client.ping().context(
                "credential service check failed; start the service or run with --offline",
            )?;
        }
        return Ok(());
    }

    let mut state = PageState::new(
        production_emissions(),
        summary_rows(),
        &asset_id,
        config.rows_per_page(),
    )?;

    if options.offline {
        footprint_tui::run_app(&mut state, &mut OfflineRuntime)
    } else {
        footprint_tui::run_app(&mut state, &mut NetworkRuntime::new(client))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    asset_id: Option<String>,
    print_config_path: bool,
    print_example: bool,
    offline: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        asset_id: None,
        print_config_path: false,
        print_example: false,
        offline: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--asset" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--asset requires an asset id"))?;
                options.asset_id = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--offline" => {
                options.offline = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("footprint: product emissions against benchmark, with verifiable credentials");
    println!("  --config <path>          Use a specific config path");
    println!("  --asset <id>             Fetch credentials for this asset id");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --offline                Use bundled sample credentials instead of the service");
    println!("  --check                  Validate config and reach the credential service");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/footprint-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                asset_id: None,
                print_config_path: false,
                print_example: false,
                offline: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_and_asset() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--asset",
                "iata:Piece/OsakaPiece",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.asset_id.as_deref(), Some("iata:Piece/OsakaPiece"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--asset"], default_options_path())
            .expect_err("missing asset value should fail");
        assert!(error.to_string().contains("--asset requires an asset id"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_check_and_offline_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--check",
                "--offline",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.offline);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
