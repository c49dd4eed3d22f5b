use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::CancellationToken;
use tokenbridge_primitives::PendingDeposit;

use super::{print_pending_deposits, print_session_balances};
use crate::{
    bridge::{connect, with_progress},
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Claims on the rollup a deposit that was escrowed but never claimed
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "claim")]
pub struct ClaimArgs {
    /// pending deposit JSON as printed by a failed deposit
    #[argh(positional)]
    pub(crate) pending: String,
}

pub(crate) fn parse_pending(raw: &str) -> Result<PendingDeposit, DisplayedError> {
    serde_json::from_str(raw.trim())
        .user_error("Invalid pending deposit. Pass the JSON line printed by the failed deposit")
}

pub async fn claim(
    ClaimArgs { pending }: ClaimArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let pending = parse_pending(&pending)?;
    let orch = connect(&settings, shutdown).await?;

    println!(
        "Claiming {} tokens for {}",
        pending.amount.to_string().green(),
        pending.recipient.to_string().yellow(),
    );
    let claim = with_progress(orch.flow_watcher(), orch.try_resume_deposit(pending))
        .await
        .inspect_err(|_| print_pending_deposits(&orch))
        .internal_error("Claim failed")?;

    println!(
        "Deposit claimed. Message {}",
        claim.message_hash().to_string().yellow()
    );
    print_session_balances(&orch);
    Ok(())
}
