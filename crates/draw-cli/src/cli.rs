use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "drawctl",
    about = "Ticket draw client: view the current draw and buy tickets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Wallet address to connect with
    #[arg(long, global = true)]
    pub wallet: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the current draw, your tickets, and the prizes
    Status(StatusArgs),
    /// Buy tickets in the current draw
    Buy(BuyArgs),
    /// Follow the draw as other buyers join and draws complete
    Watch(WatchArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct BuyArgs {
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many refreshed views
    #[arg(long, default_value = "10")]
    pub ticks: usize,
    /// How often a simulated buyer acts, in milliseconds
    #[arg(long, default_value = "400")]
    pub market_interval_ms: u64,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["drawctl", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status(_)));
        assert!(cli.config.is_none());
        assert!(matches!(cli.format, OutputFormat::Text));
    }

    #[test]
    fn parse_buy_default_count() {
        let cli = Cli::try_parse_from(["drawctl", "buy"]).unwrap();
        if let Command::Buy(args) = cli.command {
            assert_eq!(args.count, 1);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_buy_count() {
        let cli = Cli::try_parse_from(["drawctl", "buy", "-n", "3"]).unwrap();
        if let Command::Buy(args) = cli.command {
            assert_eq!(args.count, 3);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_watch() {
        let cli = Cli::try_parse_from(["drawctl", "watch", "--ticks", "4"]).unwrap();
        if let Command::Watch(args) = cli.command {
            assert_eq!(args.ticks, 4);
            assert_eq!(args.market_interval_ms, 400);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags_after_command() {
        let cli = Cli::try_parse_from([
            "drawctl",
            "status",
            "--config",
            "draw.toml",
            "--wallet",
            "0x00000000000000000000000000000000000000aa",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("draw.toml")));
        assert!(cli.wallet.is_some());
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["drawctl", "-v", "config"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Config(_)));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["drawctl", "--format", "json", "status"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["drawctl", "--format", "xml", "status"]).is_err());
    }
}
