//! Token bridge CLI

pub mod bridge;
pub mod cmd;
pub mod errors;
pub mod settings;

#[cfg(feature = "faucet")]
use cmd::mint::mint;
use cmd::{
    balance::balance, claim::claim, deposit::deposit, withdraw::withdraw, witness::witness,
    Commands, TopLevel,
};
use colored::Colorize;
use settings::Settings;
use tokenbridge_common::{logging, CancellationToken};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let TopLevel { verbose, cmd } = argh::from_env();

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    if let Err(e) = logging::init(settings.logger_config(verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    // Ctrl-C cancels the running flow; tokens already escrowed or burned stay put.
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{}", "Interrupted, cancelling".yellow());
                shutdown.cancel();
            }
        }
    });

    let result = match cmd {
        Commands::Balance(args) => balance(args, settings, shutdown).await,
        Commands::Deposit(args) => deposit(args, settings, shutdown).await,
        Commands::Claim(args) => claim(args, settings, shutdown).await,
        Commands::Withdraw(args) => withdraw(args, settings, shutdown).await,
        #[cfg(feature = "faucet")]
        Commands::Mint(args) => mint(args, settings, shutdown).await,
        Commands::Witness(args) => witness(args, settings, shutdown).await,
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
