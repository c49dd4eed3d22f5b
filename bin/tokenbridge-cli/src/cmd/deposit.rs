use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::CancellationToken;

use super::{parse_amount, print_pending_deposits, print_session_balances};
use crate::{
    bridge::{connect, with_progress},
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Bridges tokens from the L1 account to the rollup account
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "deposit")]
pub struct DepositArgs {
    /// amount of tokens to bridge
    #[argh(positional)]
    pub(crate) amount: String,
}

pub async fn deposit(
    DepositArgs { amount }: DepositArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let amount = parse_amount(&amount)?;
    let orch = connect(&settings, shutdown).await?;

    println!("Bridging {} tokens to L2", amount.to_string().green());
    let claim = with_progress(orch.flow_watcher(), orch.try_bridge_tokens_to_l2(amount))
        .await
        .inspect_err(|_| print_pending_deposits(&orch))
        .internal_error("Deposit failed")?;

    println!(
        "Deposit claimed. Message {} at leaf {}",
        claim.message_hash().to_string().yellow(),
        claim.message_leaf_index().to_string().cyan(),
    );
    print_session_balances(&orch);
    Ok(())
}
