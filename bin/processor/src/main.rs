//! Main entrypoint of the processor binary.

use clap::Parser;
use gist_attest_processor_bin::{cfg::ProcessorArgs, init_tracing_subscriber, run};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = ProcessorArgs::try_parse()?;
    init_tracing_subscriber(args.verbose)?;

    let config = args.into_config()?;
    let report = run(config).await?;

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        checkpoint = report.checkpoint,
        "Exiting processor."
    );
    Ok(())
}
