//!
//! # Kafka Service Broker CLI
//!
//! Runs the broker, and checks credentials it handed out against the cluster.
//! Broker parameters are applied in the following sequence:
//!     1) default values
//!     2) configuration file, if provided
//!     3) environment variables
//!     4) cli parameters
//!
mod run;
mod sanity;

use clap::{CommandFactory, Parser, Subcommand};

pub use run::RunBrokerOpt;
pub use sanity::{SanityError, SanityPlan, SanityTestOpt, sanity_test};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "kafka-service-broker", about = "Kafka topics as platform services")]
pub struct Root {
    /// Show version
    #[arg(short = 'v', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<RootCmd>,
}

#[derive(Debug, Subcommand)]
enum RootCmd {
    /// Run the service broker web app
    #[command(name = "run-broker", aliases = ["b", "bkr", "broker"])]
    RunBroker(RunBrokerOpt),

    /// Consume 'topic' service plan credentials JSON via STDIN and perform sanity tests
    #[command(name = "sanity-test-topic-plan")]
    SanityTestTopicPlan(SanityTestOpt),

    /// Consume 'shared' service plan credentials JSON via STDIN and perform sanity tests
    #[command(name = "sanity-test-shared-plan")]
    SanityTestSharedPlan(SanityTestOpt),
}

impl Root {
    pub async fn process(self) -> anyhow::Result<()> {
        if self.version {
            println!("kafka-service-broker {VERSION}");
            return Ok(());
        }

        match self.command {
            Some(RootCmd::RunBroker(opt)) => opt.process().await,
            Some(RootCmd::SanityTestTopicPlan(opt)) => opt.process(SanityPlan::Topic).await,
            Some(RootCmd::SanityTestSharedPlan(opt)) => opt.process(SanityPlan::Shared).await,
            None => {
                Root::command().print_help()?;
                Ok(())
            }
        }
    }
}
