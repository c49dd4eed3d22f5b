use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use tokenbridge_config::BridgeParams;
use tokenbridge_gateway::{
    traits::{MockAccountContext, MockMessageProver, MockPortalGateway, MockRollupGateway},
    GatewayError,
};
use tokenbridge_primitives::{
    Amount, BaseAddress, BurnAction, ChainSide, ClaimSecret, DepositClaim, ExitReceipt,
    FieldElement, MembershipWitness, PendingDeposit, RollupAddress, WithdrawalAuthorization,
    WithdrawalMessage,
};

use crate::{
    BridgeError, BridgeOrchestrator, BridgeOrchestratorBuilder, FlowKind, FlowState, Gateways,
};

type MockOrchestrator =
    BridgeOrchestrator<MockAccountContext, MockPortalGateway, MockRollupGateway, MockMessageProver>;

const L1_ACCOUNT: BaseAddress = BaseAddress::repeat_byte(0xa1);

fn l2_account() -> RollupAddress {
    RollupAddress::from(FieldElement::from(0xa2u64))
}

fn l2_bridge() -> RollupAddress {
    RollupAddress::from(FieldElement::from(0xb41du64))
}

fn fast_params() -> BridgeParams {
    BridgeParams {
        propagation_timeout_secs: 30,
        claim_timeout_secs: 10,
        inclusion_timeout_secs: 10,
        witness_timeout_secs: 120,
        mint_settle_delay_secs: 1,
        ..Default::default()
    }
}

fn accounts(base: Option<BaseAddress>, rollup: Option<RollupAddress>) -> MockAccountContext {
    let mut accounts = MockAccountContext::new();
    accounts.expect_base_address().return_const(base);
    accounts.expect_base_connected().return_const(base.is_some());
    accounts.expect_rollup_address().return_const(rollup);
    accounts.expect_rollup_connected().return_const(rollup.is_some());
    accounts
}

fn connected() -> MockAccountContext {
    accounts(Some(L1_ACCOUNT), Some(l2_account()))
}

fn orchestrator(
    accounts: MockAccountContext,
    portal: MockPortalGateway,
    rollup: MockRollupGateway,
    prover: MockMessageProver,
) -> MockOrchestrator {
    BridgeOrchestratorBuilder::new(Arc::new(accounts))
        .with_params(fast_params())
        .with_gateways(Gateways::new(portal, rollup, prover))
        .build()
}

fn sample_secret() -> ClaimSecret {
    ClaimSecret::new(FieldElement::from(42u64), FieldElement::from(0x42u64))
}

fn sample_claim() -> DepositClaim {
    DepositClaim::new(sample_secret(), FieldElement::from(0x1234u64), 3)
}

/// Rollup mock that hands out [`sample_secret`].
fn rollup_with_secret() -> MockRollupGateway {
    let mut rollup = MockRollupGateway::new();
    rollup
        .expect_generate_claim_secret()
        .returning(|| Ok(sample_secret()));
    rollup
}

fn expect_balances(portal: &mut MockPortalGateway, rollup: &mut MockRollupGateway) {
    portal
        .expect_read_balance()
        .returning(|_| Ok(Amount::from(900u64)));
    rollup
        .expect_read_balance()
        .returning(|_| Ok(Amount::from(100u64)));
}

/// Rollup mock that authorizes and exits successfully at block 7.
fn exiting_rollup() -> MockRollupGateway {
    let mut rollup = MockRollupGateway::new();
    rollup
        .expect_authorize_burn()
        .returning(|owner, amount, nonce| {
            WithdrawalAuthorization::new(
                l2_bridge(),
                BurnAction {
                    owner,
                    amount,
                    nonce,
                },
            )
        });
    rollup.expect_submit_authorization().returning(|_| Ok(()));
    rollup.expect_bridge_address().return_const(l2_bridge());
    rollup.expect_initiate_exit().returning(|_, _, _| {
        Ok(ExitReceipt {
            block_number: 7,
            tx_hash: Default::default(),
        })
    });
    rollup
}

fn portal_with_message() -> MockPortalGateway {
    let mut portal = MockPortalGateway::new();
    portal
        .expect_withdrawal_message()
        .returning(|amount, recipient, l2_bridge, caller_on_l1| {
            Ok(WithdrawalMessage {
                l2_bridge,
                rollup_version: 1,
                portal: BaseAddress::repeat_byte(0xb0),
                l1_chain_id: 31337,
                recipient,
                amount,
                caller_on_l1,
            })
        });
    portal
}

mod preconditions {
    use super::*;

    #[tokio::test]
    async fn test_missing_l1_account() {
        // Scenario: no L1 signer loaded
        // Expected: ConnectionMissing(L1) without touching any gateway
        let orch = orchestrator(
            accounts(None, Some(l2_account())),
            MockPortalGateway::new(),
            MockRollupGateway::new(),
            MockMessageProver::new(),
        );

        let err = orch
            .try_bridge_tokens_to_l2(Amount::from(10u64))
            .await
            .unwrap_err();

        assert_eq!(err, BridgeError::ConnectionMissing(ChainSide::L1));
        assert_eq!(
            orch.flow_state(),
            FlowState::Failed {
                flow: FlowKind::Deposit,
                error: err,
            }
        );
        assert!(!orch.loading());
    }

    #[tokio::test]
    async fn test_disconnected_rollup_account() {
        // Scenario: the rollup wallet reports an address but is disconnected
        // Expected: ConnectionMissing(L2), recorded by the non-try form
        let mut accounts = MockAccountContext::new();
        accounts.expect_base_address().return_const(Some(L1_ACCOUNT));
        accounts.expect_base_connected().return_const(true);
        accounts
            .expect_rollup_address()
            .return_const(Some(l2_account()));
        accounts.expect_rollup_connected().return_const(false);

        let orch = orchestrator(
            accounts,
            MockPortalGateway::new(),
            MockRollupGateway::new(),
            MockMessageProver::new(),
        );

        orch.withdraw_tokens_to_l1(Amount::from(10u64)).await;

        assert_eq!(orch.error().as_deref(), Some("L2 account is not connected"));
    }

    #[tokio::test]
    async fn test_unbound_gateways() {
        let orch: MockOrchestrator =
            BridgeOrchestratorBuilder::new(Arc::new(connected())).build();

        assert_eq!(
            orch.try_get_l1_balance().await.unwrap_err(),
            BridgeError::GatewaysUnbound
        );
        assert_eq!(
            orch.try_bridge_tokens_to_l2(Amount::from(1u64))
                .await
                .unwrap_err(),
            BridgeError::GatewaysUnbound
        );
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let orch = orchestrator(
            connected(),
            MockPortalGateway::new(),
            MockRollupGateway::new(),
            MockMessageProver::new(),
        );

        assert_eq!(
            orch.try_withdraw_tokens_to_l1(Amount::ZERO)
                .await
                .unwrap_err(),
            BridgeError::InvalidAmount
        );
    }
}

mod deposit {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_propagation_then_claims() {
        // Scenario: message becomes visible on the third readiness check
        // Expected: claim submitted once, balances re-read, claim returned
        let mut portal = MockPortalGateway::new();
        portal
            .expect_initiate_deposit()
            .withf(|recipient, amount, private, secret| {
                *recipient == l2_account()
                    && *amount == Amount::from(100u64)
                    && !*private
                    && *secret == sample_secret()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(sample_claim()));

        let mut rollup = rollup_with_secret();
        let checks = Arc::new(AtomicU32::new(0));
        let seen = checks.clone();
        rollup
            .expect_is_message_synced()
            .returning(move |_| Ok(seen.fetch_add(1, Ordering::SeqCst) >= 2));
        rollup
            .expect_claim_deposit()
            .withf(|_, _, claim| claim.message_leaf_index() == 3)
            .times(1)
            .returning(|_, _, _| Ok(()));
        expect_balances(&mut portal, &mut rollup);

        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());
        let claim = orch
            .try_bridge_tokens_to_l2(Amount::from(100u64))
            .await
            .unwrap();

        assert_eq!(claim, sample_claim());
        assert_eq!(checks.load(Ordering::SeqCst), 3);
        assert_eq!(orch.flow_state(), FlowState::Settled(FlowKind::Deposit));
        assert_eq!(orch.l1_balance().as_deref(), Some("900"));
        assert_eq!(orch.l2_balance().as_deref(), Some("100"));
        assert!(orch.error().is_none());
    }

    #[tokio::test]
    async fn test_escrow_failure() {
        let mut portal = MockPortalGateway::new();
        portal.expect_initiate_deposit().returning(|_, amount, _, _| {
            Err(GatewayError::InsufficientFunds {
                available: Amount::from(5u64),
                required: amount,
            })
        });
        let orch = orchestrator(
            connected(),
            portal,
            rollup_with_secret(),
            MockMessageProver::new(),
        );

        assert!(orch.bridge_tokens_to_l2(Amount::from(10u64)).await.is_none());

        assert!(matches!(
            orch.flow_state().error(),
            Some(BridgeError::Escrow(GatewayError::InsufficientFunds { .. }))
        ));
        assert_eq!(
            orch.error().as_deref(),
            Some("escrow on L1 failed: insufficient funds: have 5, need 10")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_delay_precedes_first_check() {
        // Scenario: a minimum propagation delay is configured
        // Expected: no readiness check happens before it elapses
        let mut portal = MockPortalGateway::new();
        portal
            .expect_initiate_deposit()
            .returning(|_, _, _, _| Ok(sample_claim()));
        let mut rollup = rollup_with_secret();
        let started = tokio::time::Instant::now();
        rollup.expect_is_message_synced().returning(move |_| {
            assert!(started.elapsed() >= Duration::from_secs(20));
            Ok(true)
        });
        rollup.expect_claim_deposit().returning(|_, _, _| Ok(()));
        expect_balances(&mut portal, &mut rollup);

        let orch = BridgeOrchestratorBuilder::new(Arc::new(connected()))
            .with_params(BridgeParams {
                propagation_min_delay_secs: 20,
                ..fast_params()
            })
            .with_gateways(Gateways::new(portal, rollup, MockMessageProver::new()))
            .build();

        orch.try_bridge_tokens_to_l2(Amount::from(1u64))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_propagation_check_failure() {
        // Scenario: the rollup node answers the readiness query with garbage
        // Expected: Propagation error, no claim attempted
        let mut portal = MockPortalGateway::new();
        portal
            .expect_initiate_deposit()
            .returning(|_, _, _, _| Ok(sample_claim()));
        let mut rollup = rollup_with_secret();
        rollup
            .expect_is_message_synced()
            .returning(|_| Err(GatewayError::invalid_response("not a bool")));

        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());
        let err = orch
            .try_bridge_tokens_to_l2(Amount::from(1u64))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BridgeError::Propagation(GatewayError::invalid_response("not a bool"))
        );
    }

    #[tokio::test]
    async fn test_claim_timeout_and_rejection() {
        let setup = |claim_err: GatewayError| {
            let mut portal = MockPortalGateway::new();
            portal
                .expect_initiate_deposit()
                .returning(|_, _, _, _| Ok(sample_claim()));
            let mut rollup = rollup_with_secret();
            rollup.expect_is_message_synced().returning(|_| Ok(true));
            rollup
                .expect_claim_deposit()
                .returning(move |_, _, _| Err(claim_err.clone()));
            orchestrator(connected(), portal, rollup, MockMessageProver::new())
        };

        let orch = setup(GatewayError::TimeoutExceeded(Duration::from_secs(200)));
        assert_eq!(
            orch.try_bridge_tokens_to_l2(Amount::from(1u64))
                .await
                .unwrap_err(),
            BridgeError::ClaimTimeout(Duration::from_secs(200))
        );
        // The escrowed deposit stays claimable.
        assert_eq!(orch.pending_deposits().len(), 1);

        let orch = setup(GatewayError::ClaimAlreadyConsumed);
        assert_eq!(
            orch.try_bridge_tokens_to_l2(Amount::from(1u64))
                .await
                .unwrap_err(),
            BridgeError::ClaimRejected(GatewayError::ClaimAlreadyConsumed)
        );
        // A consumed claim can never go through, so it is not kept.
        assert!(orch.pending_deposits().is_empty());
        // Balances are not refreshed after a failed claim.
        assert_eq!(orch.l2_balance(), None);
    }

    #[tokio::test]
    async fn test_secret_failure_escrows_nothing() {
        let mut portal = MockPortalGateway::new();
        portal.expect_initiate_deposit().times(0);
        let mut rollup = MockRollupGateway::new();
        rollup
            .expect_generate_claim_secret()
            .returning(|| Err(GatewayError::rpc("wallet offline")));

        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());
        let err = orch
            .try_bridge_tokens_to_l2(Amount::from(5u64))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BridgeError::ClaimSecret(GatewayError::rpc("wallet offline"))
        );
        assert!(err.is_recoverable());
        assert!(orch.pending_deposits().is_empty());
    }

    #[tokio::test]
    async fn test_failed_claim_resumes_without_escrowing_again() {
        // Scenario: the first claim is rejected, the caller resumes the pending deposit
        // Expected: one escrow, two claims with the same secret, nothing left pending
        let mut portal = MockPortalGateway::new();
        portal
            .expect_initiate_deposit()
            .times(1)
            .returning(|_, _, _, _| Ok(sample_claim()));
        let mut rollup = rollup_with_secret();
        rollup.expect_is_message_synced().returning(|_| Ok(true));
        let claims = Arc::new(AtomicU32::new(0));
        let seen = claims.clone();
        rollup
            .expect_claim_deposit()
            .withf(|recipient, amount, claim| {
                *recipient == l2_account()
                    && *amount == Amount::from(100u64)
                    && claim.claim_secret() == sample_secret().secret()
            })
            .times(2)
            .returning(move |_, _, _| {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GatewayError::TransactionRejected("nullifier race".to_owned()))
                } else {
                    Ok(())
                }
            });
        expect_balances(&mut portal, &mut rollup);

        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());
        orch.bridge_tokens_to_l2(Amount::from(100u64)).await;
        assert!(orch.error().is_some());

        let pending = orch.pending_deposits();
        assert_eq!(
            pending,
            vec![PendingDeposit {
                recipient: l2_account(),
                amount: Amount::from(100u64),
                claim: sample_claim(),
            }]
        );

        let claim = orch
            .resume_deposit(pending[0].clone())
            .await
            .unwrap();
        assert_eq!(claim, sample_claim());
        assert_eq!(claims.load(Ordering::SeqCst), 2);
        assert!(orch.pending_deposits().is_empty());
        assert_eq!(orch.flow_state(), FlowState::Settled(FlowKind::Deposit));
        assert_eq!(orch.l2_balance().as_deref(), Some("100"));
    }
}

mod withdraw {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_block_is_proven() {
        // Scenario: prover reports the block unproven twice
        // Expected: third attempt succeeds, withdrawal finalized once
        let mut portal = portal_with_message();
        portal
            .expect_finalize_withdrawal()
            .withf(|amount, recipient, block, witness| {
                *amount == Amount::from(50u64)
                    && *recipient == L1_ACCOUNT
                    && *block == 7
                    && witness.leaf_index() == 1
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let mut rollup = exiting_rollup();
        expect_balances(&mut portal, &mut rollup);

        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();
        let mut prover = MockMessageProver::new();
        prover
            .expect_membership_witness()
            .returning(move |block, _| {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GatewayError::BlockNotFinalized(block))
                } else {
                    Ok(MembershipWitness::new(1, vec![]))
                }
            });

        let orch = orchestrator(connected(), portal, rollup, prover);
        orch.try_withdraw_tokens_to_l1(Amount::from(50u64))
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(orch.flow_state(), FlowState::Settled(FlowKind::Withdrawal));
    }

    #[tokio::test(start_paused = true)]
    async fn test_witness_deadline() {
        // Scenario: the exit block never gets proven
        // Expected: WitnessUnavailable carrying the last prover error
        let mut prover = MockMessageProver::new();
        prover
            .expect_membership_witness()
            .returning(|block, _| Err(GatewayError::BlockNotFinalized(block)));

        let orch = orchestrator(connected(), portal_with_message(), exiting_rollup(), prover);
        let err = orch
            .try_withdraw_tokens_to_l1(Amount::from(50u64))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BridgeError::WitnessUnavailable(GatewayError::BlockNotFinalized(7))
        );
    }

    #[tokio::test]
    async fn test_authorization_failure_stops_flow() {
        let mut rollup = MockRollupGateway::new();
        rollup
            .expect_authorize_burn()
            .returning(|owner, amount, nonce| {
                WithdrawalAuthorization::new(
                    l2_bridge(),
                    BurnAction {
                        owner,
                        amount,
                        nonce,
                    },
                )
            });
        rollup
            .expect_submit_authorization()
            .returning(|_| Err(GatewayError::TransactionRejected("fee".to_owned())));
        rollup.expect_initiate_exit().never();

        let orch = orchestrator(
            connected(),
            MockPortalGateway::new(),
            rollup,
            MockMessageProver::new(),
        );
        let err = orch
            .try_withdraw_tokens_to_l1(Amount::from(5u64))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BridgeError::Authorization(GatewayError::TransactionRejected("fee".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_awaiting_finality() {
        // Scenario: user cancels while the prover keeps answering "not proven"
        // Expected: Failed(Cancelled), lock released, no finalize call
        let mut portal = portal_with_message();
        portal.expect_finalize_withdrawal().never();
        let mut prover = MockMessageProver::new();
        prover
            .expect_membership_witness()
            .returning(|block, _| Err(GatewayError::BlockNotFinalized(block)));

        let orch = orchestrator(connected(), portal, exiting_rollup(), prover);

        let (res, cancelled) = tokio::join!(
            orch.try_withdraw_tokens_to_l1(Amount::from(5u64)),
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                orch.cancel_flow()
            }
        );

        assert!(cancelled);
        assert_eq!(res.unwrap_err(), BridgeError::Cancelled);
        assert_eq!(
            orch.flow_state(),
            FlowState::Failed {
                flow: FlowKind::Withdrawal,
                error: BridgeError::Cancelled,
            }
        );
        assert!(!orch.loading());
        assert!(!orch.cancel_flow());
    }
}

mod session {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_dropped_flow_releases_session() {
        // Scenario: the caller drops a deposit future while it polls for propagation
        // Expected: flow marked cancelled, loading cleared, next flow can start
        let mut portal = MockPortalGateway::new();
        portal
            .expect_initiate_deposit()
            .returning(|_, _, _, _| Ok(sample_claim()));
        let mut rollup = rollup_with_secret();
        rollup.expect_is_message_synced().returning(|_| Ok(false));

        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());
        let mut watcher = orch.flow_watcher();

        let res = tokio::time::timeout(
            Duration::from_secs(5),
            orch.try_bridge_tokens_to_l2(Amount::from(1u64)),
        )
        .await;
        assert!(res.is_err());
        // Escrow went through before the drop; the claim is still held.
        assert_eq!(orch.pending_deposits().len(), 1);

        assert!(watcher.has_changed().unwrap());
        assert_eq!(
            *watcher.borrow_and_update(),
            FlowState::Failed {
                flow: FlowKind::Deposit,
                error: BridgeError::Cancelled,
            }
        );
        assert!(!orch.loading());

        let err = orch
            .try_withdraw_tokens_to_l1(Amount::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::InvalidAmount);
    }

    #[tokio::test]
    async fn test_rebind_drops_cached_balances() {
        let mut portal = MockPortalGateway::new();
        let mut rollup = MockRollupGateway::new();
        expect_balances(&mut portal, &mut rollup);
        let orch = orchestrator(connected(), portal, rollup, MockMessageProver::new());

        orch.get_l1_balance().await;
        orch.get_l2_balance().await;
        assert_eq!(orch.l1_balance().as_deref(), Some("900"));

        orch.rebind(Gateways::new(
            MockPortalGateway::new(),
            MockRollupGateway::new(),
            MockMessageProver::new(),
        ));
        assert_eq!(orch.session().l1_balance(), None);
        assert_eq!(orch.session().l2_balance(), None);
        assert!(orch.unbind().is_some());
        assert_eq!(
            orch.try_get_l2_balance().await.unwrap_err(),
            BridgeError::GatewaysUnbound
        );
    }

    #[tokio::test]
    async fn test_failed_balance_read_keeps_previous_value() {
        let mut portal = MockPortalGateway::new();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        portal.expect_read_balance().returning(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Amount::from(10u64))
            } else {
                Err(GatewayError::rpc("connection refused"))
            }
        });
        let orch = orchestrator(
            connected(),
            portal,
            MockRollupGateway::new(),
            MockMessageProver::new(),
        );

        orch.get_l1_balance().await;
        orch.get_l1_balance().await;

        assert_eq!(orch.l1_balance().as_deref(), Some("10"));
        assert_eq!(
            orch.error().as_deref(),
            Some("reading L1 balance failed: rpc unavailable: connection refused")
        );
        assert!(!orch.loading());
    }

    #[tokio::test]
    async fn test_new_flow_clears_previous_error() {
        let mut portal = MockPortalGateway::new();
        portal
            .expect_read_balance()
            .returning(|_| Err(GatewayError::rpc("down")));
        let orch = orchestrator(
            connected(),
            portal,
            MockRollupGateway::new(),
            MockMessageProver::new(),
        );

        orch.get_l1_balance().await;
        assert!(orch.error().is_some());

        // The next flow starts fresh even though it fails on its own precondition.
        let _ = orch.try_bridge_tokens_to_l2(Amount::ZERO).await;
        assert!(orch.error().is_none());
        assert!(matches!(
            orch.flow_state(),
            FlowState::Failed {
                flow: FlowKind::Deposit,
                ..
            }
        ));
    }
}
