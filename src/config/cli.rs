use crate::config::report_options::ReportOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "laszy")]
#[command(about = "Summarize, report on and validate LAS/LAZ LiDAR files")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, short, global = true, help = "Enable verbose output and progress bars")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the summary of one LAS/LAZ file as JSON
    Summarize {
        file: String,

        #[arg(long, help = "Read the headers and VLRs only")]
        header_only: bool,

        #[arg(long, help = "Also write <stem>.json into this directory")]
        outdir: Option<PathBuf>,
    },

    /// Build a CSV report from LAS/LAZ files and summary JSON files
    Report {
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(long)]
        outdir: Option<String>,

        #[arg(long, help = "Report file name")]
        name: Option<String>,

        #[arg(long, help = "Write a summary JSON for each LAS/LAZ file")]
        to_json: bool,

        #[arg(long, help = "Validate the report once written")]
        validate: bool,

        #[arg(long, help = "Ignore completed logs and start a fresh report")]
        no_check_logs: bool,

        #[arg(long, short, help = "Number of files summarized in parallel")]
        jobs: Option<usize>,
    },

    /// Validate an existing CSV report
    Validate {
        report: PathBuf,

        #[arg(long, help = "Directory for the error outputs")]
        outdir: Option<PathBuf>,
    },
}

impl CliConfig {
    /// Lay report flags over `base`. Flags only ever switch features on.
    pub fn report_options(&self, base: ReportOptions) -> ReportOptions {
        let mut options = base;
        options.verbose |= self.verbose;
        options.monitor |= self.monitor;

        if let Command::Report {
            outdir,
            name,
            to_json,
            validate,
            no_check_logs,
            jobs,
            ..
        } = &self.command
        {
            if let Some(outdir) = outdir {
                options.output_dir = outdir.clone();
            }
            if let Some(name) = name {
                options.name = name.clone();
            }
            options.to_json |= *to_json;
            options.validate |= *validate;
            if *no_check_logs {
                options.check_logs = false;
            }
            if let Some(jobs) = jobs {
                options.jobs = *jobs;
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_flags_override_base() {
        let cli = CliConfig::parse_from([
            "laszy",
            "report",
            "a.las",
            "b.laz",
            "--outdir",
            "out",
            "--to-json",
            "--no-check-logs",
            "--jobs",
            "3",
            "-v",
        ]);

        let options = cli.report_options(ReportOptions::default());
        assert_eq!(options.output_dir, "out");
        assert!(options.to_json);
        assert!(!options.check_logs);
        assert!(!options.validate);
        assert_eq!(options.jobs, 3);
        assert!(options.verbose);

        match cli.command {
            Command::Report { files, .. } => assert_eq!(files, vec!["a.las", "b.laz"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate_subcommand() {
        let cli = CliConfig::parse_from(["laszy", "validate", "report.csv", "--log-json"]);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Validate { outdir: None, .. }));
    }

    #[test]
    fn test_report_requires_files() {
        assert!(CliConfig::try_parse_from(["laszy", "report"]).is_err());
    }
}
