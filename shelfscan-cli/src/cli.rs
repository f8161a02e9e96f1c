//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Shelfscan -- look up food products by barcode and find healthier,
/// more sustainable alternatives sold at Coop in Switzerland.
///
/// Use `shelfscan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "shelfscan", version, about, long_about = None)]
pub struct Cli {
    /// Path to the shelfscan.toml configuration file (optional; defaults apply when missing).
    #[arg(short, long, global = true, default_value = "shelfscan.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Override message and product-name language (de, fr, it, en).
    #[arg(long, global = true)]
    pub locale: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a single barcode.
    Lookup(LookupArgs),

    /// Read barcodes from a keyboard-wedge scanner on stdin and look each one up.
    Scan(ScanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- lookup ----

/// Look up one product and its alternatives.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Barcode (EAN/UPC digits).
    pub code: String,

    /// Skip the alternative-suggestion searches.
    #[arg(long)]
    pub no_alternatives: bool,
}

// ---- scan ----

/// Continuous scanning from stdin.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Device to scan from (default: `[scanner] device`, then the first device).
    #[arg(long)]
    pub device: Option<String>,

    /// List available devices and exit.
    #[arg(long)]
    pub list_devices: bool,

    /// Stop after the first decoded barcode.
    #[arg(long)]
    pub once: bool,

    /// Skip the alternative-suggestion searches.
    #[arg(long)]
    pub no_alternatives: bool,
}

// ---- config ----

/// Manage shelfscan configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, api, alternatives, scanner).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_lookup() {
        let cli = Cli::try_parse_from(["shelfscan", "lookup", "737628064502"])
            .expect("should parse 'lookup' subcommand");
        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.code, "737628064502");
                assert!(!args.no_alternatives, "alternatives should default to on");
            }
            _ => panic!("expected Lookup command"),
        }
    }

    #[test]
    fn test_cli_parse_lookup_no_alternatives() {
        let cli = Cli::try_parse_from(["shelfscan", "lookup", "1", "--no-alternatives"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Lookup(args) => assert!(args.no_alternatives),
            _ => panic!("expected Lookup command"),
        }
    }

    #[test]
    fn test_cli_lookup_requires_code() {
        let result = Cli::try_parse_from(["shelfscan", "lookup"]);
        assert!(result.is_err(), "lookup without a code should fail");
    }

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["shelfscan", "scan"]).expect("parse succeeded");
        match cli.command {
            Commands::Scan(args) => {
                assert!(args.device.is_none());
                assert!(!args.list_devices);
                assert!(!args.once);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "shelfscan",
            "scan",
            "--device",
            "keyboard",
            "--once",
            "--no-alternatives",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.device.as_deref(), Some("keyboard"));
                assert!(args.once);
                assert!(args.no_alternatives);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["shelfscan", "config", "show", "--section", "api"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => assert_eq!(section.as_deref(), Some("api")),
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "shelfscan",
            "lookup",
            "1",
            "--output",
            "json",
            "--locale",
            "fr",
            "--log-level",
            "debug",
            "--config",
            "/etc/shelfscan.toml",
        ])
        .expect("parse succeeded");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.locale.as_deref(), Some("fr"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, PathBuf::from("/etc/shelfscan.toml"));
    }

    #[test]
    fn test_cli_default_config_path() {
        let cli = Cli::try_parse_from(["shelfscan", "config", "validate"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("shelfscan.toml"));
        assert!(matches!(cli.output, OutputFormat::Text));
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["shelfscan", "--output", "yaml", "scan"]);
        assert!(result.is_err());
    }
}
