use anyhow::Result;
use clap::Parser;
use doc_shrink::cli::{
    execute_inspect, execute_shrink, execute_trial, Cli, Commands, ShrinkOptions, TrialOptions,
};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Shrink {
            input,
            output,
            target_kb,
            target_mb,
            format,
            workers,
            config,
            json,
            quiet,
        } => {
            let report = execute_shrink(ShrinkOptions {
                input,
                output,
                target_kb,
                target_mb,
                format,
                workers,
                config,
                json,
                quiet,
            })
            .await?;
            if !report.met_target() {
                // 目標未達でも出力は書き出されている
                log::warn!("目標サイズに届きませんでした: {}", report.summary());
            }
        }
        Commands::Trial {
            input,
            output,
            quality,
            scale,
            format,
            workers,
        } => {
            execute_trial(TrialOptions {
                input,
                output,
                quality,
                scale,
                format,
                workers,
            })
            .await?;
        }
        Commands::Inspect { input, format } => {
            execute_inspect(input, format).await?;
        }
    }

    Ok(())
}
