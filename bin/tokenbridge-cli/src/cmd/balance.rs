use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::CancellationToken;

use crate::{
    bridge::connect,
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Prints the token balances of the connected L1 and L2 accounts
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "balance")]
pub struct BalanceArgs {}

pub async fn balance(
    _args: BalanceArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let orch = connect(&settings, shutdown).await?;

    let (l1, l2) = tokio::join!(orch.try_get_l1_balance(), orch.try_get_l2_balance());
    let l1 = l1.internal_error("Failed to read the L1 balance")?;
    let l2 = l2.internal_error("Failed to read the L2 balance")?;

    println!("L1 balance: {}", l1.to_string().green());
    println!("L2 balance: {}", l2.to_string().green());
    Ok(())
}
