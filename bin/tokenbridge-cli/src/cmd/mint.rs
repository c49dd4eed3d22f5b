use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::CancellationToken;

use crate::{
    bridge::{connect, with_progress},
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Mints test tokens to the L1 account through the faucet contract
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "mint")]
pub struct MintArgs {}

pub async fn mint(
    _args: MintArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let orch = connect(&settings, shutdown).await?;

    let balance = with_progress(orch.flow_watcher(), orch.try_mint_l1_tokens())
        .await
        .internal_error("Mint failed")?;

    println!("L1 balance: {}", balance.to_string().green());
    Ok(())
}
