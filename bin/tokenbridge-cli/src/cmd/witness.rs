use argh::FromArgs;
use colored::Colorize;
use tokenbridge_common::{retry::with_cancellation, CancellationToken};
use tokenbridge_gateway::{MessageProver, NodeMessageProver};
use tokenbridge_primitives::FieldElement;

use crate::{
    errors::{DisplayableError, DisplayedError},
    settings::Settings,
};

/// Fetches the outbox membership witness of an L2-to-L1 message from the rollup node
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "witness")]
pub struct WitnessArgs {
    /// L2 block the message was emitted in
    #[argh(positional)]
    block_number: u64,

    /// message leaf as a 0x-prefixed field element
    #[argh(positional)]
    message: String,
}

pub async fn witness(
    WitnessArgs {
        block_number,
        message,
    }: WitnessArgs,
    settings: Settings,
    shutdown: CancellationToken,
) -> Result<(), DisplayedError> {
    let leaf: FieldElement = message
        .parse()
        .user_error(format!("Invalid message '{message}'. Must be a field element"))?;
    let prover = NodeMessageProver::from_url(&settings.config.endpoints.rollup_node_url)
        .user_error("Invalid rollup node URL. Check the config file")?;

    let witness = with_cancellation(&shutdown, prover.membership_witness(block_number, leaf))
        .await
        .internal_error("Interrupted")?
        .internal_error("Failed to fetch the membership witness")?;

    println!(
        "Leaf index: {} (depth {})",
        witness.leaf_index().to_string().cyan(),
        witness.depth()
    );
    for (level, sibling) in witness.sibling_path().iter().enumerate() {
        println!("  [{level:>2}] {}", sibling.to_string().yellow());
    }
    Ok(())
}
