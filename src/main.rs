use std::path::PathBuf;

use clap::Parser;
use troika::exec::Dispatcher;

#[derive(Parser)]
#[command(name = "tk", about = concat!("troika v", env!("CARGO_PKG_VERSION"), " - pending, done, trash"), version)]
struct Cli {
    /// Directory holding tasks.json and settings.toml
    /// (default: $TROIKA_HOME, then the current directory)
    #[arg(short = 'd', long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Run without touching any files
    #[arg(long)]
    ephemeral: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = if cli.ephemeral {
        Ok(Dispatcher::in_memory())
    } else {
        let dir = cli
            .data_dir
            .or_else(|| std::env::var_os("TROIKA_HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        Dispatcher::open(&dir)
    };

    let mut dispatcher = match result {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = troika::repl::run(&mut dispatcher) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
