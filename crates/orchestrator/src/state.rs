//! Flow state machines published to observers.

use std::fmt;

use crate::BridgeError;

/// Which operation a flow performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Deposit,
    Withdrawal,
    Mint,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowKind::Deposit => "deposit",
            FlowKind::Withdrawal => "withdrawal",
            FlowKind::Mint => "mint",
        })
    }
}

/// Steps of a deposit from L1 into the rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositStage {
    /// Tokens are being locked in the L1 portal.
    Escrowing,
    /// Waiting for the deposit message to reach the rollup inbox.
    AwaitingPropagation,
    /// Consuming the message on the rollup.
    Claiming,
}

impl DepositStage {
    fn next(self) -> Option<Self> {
        match self {
            DepositStage::Escrowing => Some(DepositStage::AwaitingPropagation),
            DepositStage::AwaitingPropagation => Some(DepositStage::Claiming),
            DepositStage::Claiming => None,
        }
    }
}

/// Steps of a withdrawal from the rollup back to L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalStage {
    /// Publishing the burn authorization for the bridge.
    Authorizing,
    /// Burning on the rollup and emitting the exit message.
    Exiting,
    /// Waiting until the exit block can be proven on L1.
    AwaitingFinality,
    /// Releasing the tokens from the L1 portal.
    Finalizing,
}

impl WithdrawalStage {
    fn next(self) -> Option<Self> {
        match self {
            WithdrawalStage::Authorizing => Some(WithdrawalStage::Exiting),
            WithdrawalStage::Exiting => Some(WithdrawalStage::AwaitingFinality),
            WithdrawalStage::AwaitingFinality => Some(WithdrawalStage::Finalizing),
            WithdrawalStage::Finalizing => None,
        }
    }
}

/// Where the current (or most recent) flow stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    Deposit(DepositStage),
    Withdrawal(WithdrawalStage),
    Minting,
    Settled(FlowKind),
    Failed {
        flow: FlowKind,
        error: BridgeError,
    },
}

impl FlowState {
    /// The flow this state belongs to, `None` when idle.
    pub fn flow(&self) -> Option<FlowKind> {
        match self {
            FlowState::Idle => None,
            FlowState::Deposit(_) => Some(FlowKind::Deposit),
            FlowState::Withdrawal(_) => Some(FlowKind::Withdrawal),
            FlowState::Minting => Some(FlowKind::Mint),
            FlowState::Settled(flow) | FlowState::Failed { flow, .. } => Some(*flow),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Settled(_) | FlowState::Failed { .. })
    }

    /// Returns true while a flow is between its first step and a terminal state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != FlowState::Idle
    }

    /// The error a failed flow ended with.
    pub fn error(&self) -> Option<&BridgeError> {
        match self {
            FlowState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal step.
    ///
    /// Flows start from `Idle` or from a terminal state, walk their stages in
    /// order and may fail from any non-terminal state. A resumed deposit starts
    /// at its propagation wait, its escrow being done already.
    pub fn can_transition_to(&self, next: &FlowState) -> bool {
        use FlowState::*;

        match (self, next) {
            (_, Idle) => self.is_terminal(),

            (Idle | Settled(_) | Failed { .. }, Deposit(DepositStage::Escrowing))
            | (Idle | Settled(_) | Failed { .. }, Deposit(DepositStage::AwaitingPropagation))
            | (Idle | Settled(_) | Failed { .. }, Withdrawal(WithdrawalStage::Authorizing))
            | (Idle | Settled(_) | Failed { .. }, Minting) => true,

            (Idle, Failed { .. }) => true,
            (Deposit(_), Failed { flow, .. }) => *flow == FlowKind::Deposit,
            (Withdrawal(_), Failed { flow, .. }) => *flow == FlowKind::Withdrawal,
            (Minting, Failed { flow, .. }) => *flow == FlowKind::Mint,

            (Deposit(from), Deposit(to)) => from.next() == Some(*to),
            (Withdrawal(from), Withdrawal(to)) => from.next() == Some(*to),

            (Deposit(from), Settled(FlowKind::Deposit)) => from.next().is_none(),
            (Withdrawal(from), Settled(FlowKind::Withdrawal)) => from.next().is_none(),
            (Minting, Settled(FlowKind::Mint)) => true,

            _ => false,
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Idle => f.write_str("idle"),
            FlowState::Deposit(stage) => {
                let stage = match stage {
                    DepositStage::Escrowing => "escrowing on L1",
                    DepositStage::AwaitingPropagation => "waiting for the message to reach L2",
                    DepositStage::Claiming => "claiming on L2",
                };
                write!(f, "deposit: {stage}")
            }
            FlowState::Withdrawal(stage) => {
                let stage = match stage {
                    WithdrawalStage::Authorizing => "authorizing burn",
                    WithdrawalStage::Exiting => "exiting L2",
                    WithdrawalStage::AwaitingFinality => "waiting for the exit block proof",
                    WithdrawalStage::Finalizing => "finalizing on L1",
                };
                write!(f, "withdrawal: {stage}")
            }
            FlowState::Minting => f.write_str("mint: minting on L1"),
            FlowState::Settled(flow) => write!(f, "{flow}: settled"),
            FlowState::Failed { flow, error } => write!(f, "{flow}: failed ({error})"),
        }
    }
}
