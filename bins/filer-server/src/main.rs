use std::path::PathBuf;

use clap::Parser;
use filer_rpc::{FilerServer, ServerConfig};

/// Filer: hierarchical namespace over chunk storage
#[derive(Parser, Debug)]
#[command(name = "filer-server", version, about)]
struct Args {
    /// Path to configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", filer_app::dump_default_config::<ServerConfig>()?);
        return Ok(());
    }

    let config: ServerConfig = filer_app::load_config(args.config.as_deref())?;
    let _guard = filer_logging::init_logging(&config.log)?;

    tracing::info!(config = ?args.config, listen = %config.http.listen, "starting filer");
    filer_app::run_application(FilerServer::new(), config).await?;
    Ok(())
}
