use clap::Parser;

use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::logging;
use crate::interfaces::cli::{self, Cli, Command};
use crate::interfaces::state::AppState;

pub fn run() -> Result<()> {
    // a missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    logging::init(&config.log_filter);
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        provider = %config.llm.provider,
        model = %config.llm.model,
        "Configuration loaded"
    );

    let state = AppState::new(config);

    match cli.command {
        Command::Serve { host, port } => cli::serve(state, host, port),
        command => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::execute(command, &state))
        }
    }
}
