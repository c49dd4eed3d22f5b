pub mod balance;
pub mod claim;
pub mod deposit;
#[cfg(feature = "faucet")]
pub mod mint;
pub mod withdraw;
pub mod witness;

use argh::FromArgs;
use balance::BalanceArgs;
use claim::ClaimArgs;
use colored::Colorize;
use deposit::DepositArgs;
#[cfg(feature = "faucet")]
use mint::MintArgs;
use tokenbridge_primitives::Amount;
use withdraw::WithdrawArgs;
use witness::WitnessArgs;

use crate::{
    bridge::CliOrchestrator,
    errors::{DisplayableError, DisplayedError},
};

/// Moves tokens between the L1 base chain and the rollup
#[derive(FromArgs, PartialEq, Debug)]
pub struct TopLevel {
    /// log at debug level
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    #[argh(subcommand)]
    pub cmd: Commands,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum Commands {
    Balance(BalanceArgs),
    Deposit(DepositArgs),
    Claim(ClaimArgs),
    Withdraw(WithdrawArgs),
    #[cfg(feature = "faucet")]
    Mint(MintArgs),
    Witness(WitnessArgs),
}

pub(crate) fn parse_amount(raw: &str) -> Result<Amount, DisplayedError> {
    let amount: Amount = raw
        .parse()
        .user_error(format!("Invalid amount '{raw}'. Must be a whole number of tokens"))?;
    if amount.is_zero() {
        return Err(DisplayedError::UserError(
            "Amount must be positive".to_owned(),
            Box::new(amount),
        ));
    }
    Ok(amount)
}

/// Prints deposits still waiting for a claim, one JSON line each, so they can
/// be passed to `claim` later.
pub(crate) fn print_pending_deposits(orch: &CliOrchestrator) {
    for pending in orch.pending_deposits() {
        match serde_json::to_string(&pending) {
            Ok(line) => {
                eprintln!("{}", "Deposit escrowed but not claimed. Finish it with:".yellow());
                println!("{line}");
            }
            Err(err) => eprintln!("Failed to export pending deposit: {err}"),
        }
    }
}

/// Prints whatever the session holds after a flow.
pub(crate) fn print_session_balances(orch: &CliOrchestrator) {
    let show = |b: Option<String>| b.unwrap_or_else(|| "unknown".to_owned());
    println!("L1 balance: {}", show(orch.l1_balance()).green());
    println!("L2 balance: {}", show(orch.l2_balance()).green());
}
