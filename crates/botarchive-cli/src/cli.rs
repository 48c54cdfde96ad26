use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "botarchive",
    about = "Bot Archive: a moderated bot directory",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// List approved bots or pending suggestions
    List(ListArgs),
    /// Delete both collections
    Flush(FlushArgs),
    /// Print the SHA-256 digest of an admin password
    HashPassword(HashPasswordArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Show pending suggestions instead of approved bots
    #[arg(long)]
    pub pending: bool,
    /// Case-insensitive name substring
    #[arg(short, long)]
    pub query: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct FlushArgs {
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Required; flushing cannot be undone
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct HashPasswordArgs {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "botarchive",
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--data-dir",
            "/tmp/bots",
        ])
        .unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.bind.unwrap().port(), 8080);
                assert_eq!(args.data_dir.unwrap(), PathBuf::from("/tmp/bots"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "botarchive",
            "list",
            "--pending",
            "-q",
            "mod",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::List(args) => {
                assert!(args.pending);
                assert_eq!(args.query.as_deref(), Some("mod"));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn hash_password_needs_argument() {
        assert!(Cli::try_parse_from(["botarchive", "hash-password"]).is_err());
        assert!(Cli::try_parse_from(["botarchive", "hash-password", "pw"]).is_ok());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(Cli::try_parse_from(["botarchive", "serve", "--bind", "nowhere"]).is_err());
    }
}
