use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use load_test_util::users::UserPool;
use tester::client::HttpClient;
use tester::config::TesterArgs;
use tester::runner::run;
use tester::statistics::RunSummary;

fn main() -> anyhow::Result<()> {
    let args = TesterArgs::parse();
    tester::logging::init(args.log_format)?;
    args.validate()?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let _guard = rt.enter();
    let summary = rt.block_on(run_tester(&args))?;
    println!("{summary}");
    Ok(())
}

async fn run_tester(args: &TesterArgs) -> anyhow::Result<RunSummary> {
    let client = HttpClient::new(args.client_options()).context("Failed to build http client")?;
    let pool = UserPool::new(args.synthetic_users);
    run(args.run_config(), Arc::new(client), pool).await
}
