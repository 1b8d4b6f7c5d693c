use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use modprox_proxy::Proxy;

/// Serve module archives from a directory over the module proxy protocol.
#[derive(Parser)]
#[command(name = "modprox", version)]
struct Args {
    /// Directory of module archives (`<path>_<vers>.txtar`, `.txt`, or
    /// unpacked directories).
    #[arg(long, default_value = "testmod")]
    dir: PathBuf,

    /// Address to listen on; empty picks an arbitrary free localhost port.
    #[arg(long, default_value = "")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let proxy = Proxy::bind(&args.dir, &args.addr)
        .with_context(|| format!("cannot serve modules from {}", args.dir.display()))?;
    println!("{}", proxy.url());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for interrupt")?;
    proxy.close().await;
    Ok(())
}
