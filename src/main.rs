// src/main.rs

use jobsched::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("jobsched error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    // Before logging, so `JOBSCHED_LOG` can come from the file too.
    let env_file = config::load_env_file(None);

    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    config::report_env_file(&env_file);

    run(args).await
}
