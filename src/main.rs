use anyhow::Context;
use clap::Parser;
use laszy::config::{CliConfig, Command, LaszyConfig};
use laszy::utils::error::{ErrorSeverity, LaszyError};
use laszy::utils::validation::{validate_file_extensions, Validate};
use laszy::utils::logger;
use laszy::{Laszy, LaszyReport, ReportValidator, SummaryOptions};
use std::path::Path;

fn exit_code(e: &LaszyError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: LaszyError) -> ! {
    tracing::error!(
        "❌ laszy failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e).max(1));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let file_config = match &cli.config {
        Some(path) => LaszyConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => LaszyConfig::default(),
    };

    if cli.log_json || file_config.log_json() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let options = cli.report_options(file_config.report_options());
    if let Err(e) = options.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }
    if options.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match cli.command {
        Command::Summarize {
            file,
            header_only,
            outdir,
        } => {
            let summary_options = SummaryOptions {
                header_only,
                outdir,
            };
            let summary = Laszy::open(&file, !header_only)
                .and_then(|mut las| las.summarize(&summary_options))
                .unwrap_or_else(|e| fail(e));
            let json = laszy::core::laszy::to_pretty_json(&summary).unwrap_or_else(|e| fail(e));
            println!("{}", String::from_utf8_lossy(&json));
        }
        Command::Report { files, .. } => {
            let report = LaszyReport::new(files, options);
            match report.write().await {
                Ok(path) => {
                    tracing::info!("✅ Report completed");
                    println!("📁 Report saved to: {}", path);
                }
                Err(e) => fail(e),
            }
        }
        Command::Validate { report, outdir } => {
            validate_file_extensions("report", &[report.display().to_string()], &["csv"])
                .unwrap_or_else(|e| fail(e));
            let validator = ReportValidator::new(options.rules.clone()).unwrap_or_else(|e| fail(e));
            let outcome = validator
                .validate_report(&report, outdir.as_deref())
                .unwrap_or_else(|e| fail(e));
            if outcome.is_clean() {
                println!("✅ {} passed validation", report.display());
            } else {
                for (issue, count) in &outcome.issues {
                    println!("{}: {}", issue, count);
                }
                if let Some(errors) = outcome.errors_path.as_deref().map(Path::display) {
                    println!("📁 Details saved to: {}", errors);
                }
            }
        }
    }

    Ok(())
}
