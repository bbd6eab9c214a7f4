use clap::Parser;
use donutfs_cli::config::{DEFAULT_HOST, DEFAULT_PORT};
use donutfs_cli::{Command, ConnectionConfig};

/// DonutFS - a filesystem on a remote hash service
#[derive(Parser, Debug)]
#[command(name = "donutfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hash service host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Hash service port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Length-prefix every message (the server must agree)
    #[arg(long)]
    framed: bool,

    /// More logging; repeat for more detail (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = ConnectionConfig::new(args.host, args.port).with_framing(args.framed);
    if let Err(e) = donutfs_cli::run(&config, &args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
