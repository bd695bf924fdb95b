use clap::Parser;

use kafka_broker_cli::Root;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fluvio_future::subscriber::init_tracer(None);
    let root = Root::parse();
    root.process().await
}
