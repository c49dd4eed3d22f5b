use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::CancellationToken;

use super::{parse_amount, print_session_balances};
use crate::{
    bridge::{connect, with_progress},
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Withdraws tokens from the rollup account back to the L1 account
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "withdraw")]
pub struct WithdrawArgs {
    /// amount of tokens to withdraw
    #[argh(positional)]
    amount: String,
}

pub async fn withdraw(
    WithdrawArgs { amount }: WithdrawArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let amount = parse_amount(&amount)?;
    let orch = connect(&settings, shutdown).await?;

    println!("Withdrawing {} tokens to L1", amount.to_string().green());
    with_progress(orch.flow_watcher(), orch.try_withdraw_tokens_to_l1(amount))
        .await
        .internal_error("Withdrawal failed")?;

    println!("Withdrawal finalized on L1");
    print_session_balances(&orch);
    Ok(())
}
