mod common;

use assert_matches::assert_matches;
use common::*;
use ogal_client::rpc::{RpcFailure, SignatureStatus};
use ogal_client::{CancellationToken, KeypairSigner, LedgerError};
use ogal_core::collection::GuardRailViolation;
use ogal_core::creators::CreatorRequest;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

fn setup(with_secondary: bool) -> (World, KeypairSigner, Pubkey) {
    let payer = Keypair::new();
    let world = World::new(&payer, with_secondary);
    let key = payer.pubkey();
    (world, KeypairSigner::new(payer), key)
}

#[tokio::test]
async fn happy_path_submits_once_without_downgrade() {
    let (world, signer, payer) = setup(false);
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(1, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.submission.confirmed);
    assert_eq!(outcome.submission.attempts, 1);
    assert!(outcome.submission.creators_downgraded.is_empty());
    assert_eq!(outcome.submission.creators.len(), 1);
    assert_eq!(outcome.submission.creators[0].address, payer);
    assert!(outcome.submission.creators[0].verified);
    assert_eq!(world.primary.send_count(), 1);

    let tx = &world.primary.sent()[0];
    assert_eq!(tx.message.account_keys[0], payer);
    assert_ne!(tx.signatures[0], Signature::default());
    assert_eq!(outcome.submission.signature, tx.signatures[0]);
    assert_eq!(sent_creators(tx, &world.program_id), outcome.submission.creators);
}

#[tokio::test]
async fn mismatched_collection_authority_never_submits() {
    let (world, signer, _) = setup(false);
    world.set_collection_authority(&Pubkey::new_unique());
    let service = world.service(signer);

    let err = service
        .mint(mint_request(2, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::CollectionAuthorityMismatch { .. },
            transaction: None,
        }
    );
    assert_eq!(world.primary.send_count(), 0);
}

#[tokio::test]
async fn unlimited_master_edition_is_rejected_locally() {
    let (world, signer, _) = setup(false);
    world.set_edition(None);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(3, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::MasterEditionNotUnique { max_supply: None, .. },
            ..
        }
    );
    assert_eq!(world.primary.send_count(), 0);
}

#[tokio::test]
async fn paused_registry_refuses_mint() {
    let (world, signer, _) = setup(false);
    world.set_registry(true);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(4, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::RegistryPaused);
    assert_eq!(world.primary.send_count(), 0);
}

#[tokio::test]
async fn creator_signature_mismatch_downgrades_all_once() {
    let (world, signer, payer) = setup(false);
    world
        .primary
        .script([Err(RpcFailure::rejected("custom program error: 0x178f", None))]);
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(5, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(world.primary.send_count(), 2);
    assert_eq!(outcome.submission.attempts, 2);
    assert_eq!(outcome.submission.creators_downgraded, vec![payer]);
    assert!(outcome.submission.creators.iter().all(|c| !c.verified));

    let sent = world.primary.sent();
    assert!(sent_creators(&sent[0], &world.program_id)[0].verified);
    assert!(!sent_creators(&sent[1], &world.program_id)[0].verified);
}

#[tokio::test]
async fn second_creator_mismatch_is_fatal() {
    let (world, signer, _) = setup(false);
    let mismatch = || -> Result<Signature, RpcFailure> {
        Err(RpcFailure::rejected("InstructionError(2, Custom(6031))", Some(6031)))
    };
    world.primary.script([mismatch(), mismatch()]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(6, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        LedgerError::CreatorSignatureMismatch { code: 6031, transaction: Some(_), .. }
    );
    assert_eq!(world.primary.send_count(), 2);
}

#[tokio::test]
async fn creators_the_signer_cannot_sign_for_are_downgraded_before_sending() {
    let (world, signer, payer) = setup(false);
    let artist = Pubkey::new_unique();
    let service = world.service(signer);

    let creators = vec![
        CreatorRequest { address: None, verified: true, share: 50 },
        CreatorRequest { address: Some(artist), verified: true, share: 50 },
    ];
    let outcome = service
        .mint(mint_request(7, creators), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(world.primary.send_count(), 1);
    assert_eq!(outcome.submission.creators_downgraded, vec![artist]);
    let sent = sent_creators(&world.primary.sent()[0], &world.program_id);
    assert_eq!(sent[0].address, payer);
    assert!(sent[0].verified);
    assert_eq!(sent[1].address, artist);
    assert!(!sent[1].verified);
}

#[tokio::test]
async fn sole_foreign_creator_is_downgraded_when_payer_can_sign() {
    let (world, signer, _) = setup(false);
    let service = world.service(signer);

    let creators = vec![CreatorRequest {
        address: Some(Pubkey::new_unique()),
        verified: true,
        share: 100,
    }];
    let outcome = service
        .mint(mint_request(8, creators), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.submission.creators_downgraded.len(), 1);
    assert!(!outcome.submission.creators[0].verified);
}

#[tokio::test]
async fn transport_failures_retry_then_fail_over() {
    let (world, signer, _) = setup(true);
    let down = || -> Result<Signature, RpcFailure> { Err(RpcFailure::transport("connection refused")) };
    world.primary.script([down(), down(), down(), down()]);
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(9, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();

    let secondary = world.secondary.as_ref().unwrap();
    assert_eq!(world.primary.send_count(), 4);
    assert_eq!(secondary.send_count(), 1);
    assert_eq!(outcome.submission.endpoint, secondary.name);
    assert_eq!(outcome.submission.attempts, 5);
    assert!(outcome.submission.confirmed);
}

#[tokio::test]
async fn transport_exhaustion_without_secondary() {
    let (world, signer, _) = setup(false);
    let down = || -> Result<Signature, RpcFailure> { Err(RpcFailure::transport("timed out")) };
    world.primary.script([down(), down(), down(), down()]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(10, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::TransportExhausted { attempts: 4, .. });
    assert!(err.is_retryable());
}

#[tokio::test]
async fn program_guard_rail_code_is_reported_with_transaction() {
    let (world, signer, _) = setup(false);
    world
        .primary
        .script([Err(RpcFailure::rejected("custom program error: 0x63", None))]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(11, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::CollectionAuthorityMismatch { .. },
            transaction: Some(_),
        }
    );
    assert_eq!(world.primary.send_count(), 1);
}

#[tokio::test]
async fn other_rejections_are_fatal_with_known_message() {
    let (world, signer, _) = setup(false);
    world
        .primary
        .script([Err(RpcFailure::rejected("instruction 2: custom program error: 0x177f", Some(6015)))]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(12, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::ProgramRejected { code: Some(6015), .. });
    assert_eq!(world.primary.send_count(), 1);
    assert!(err.diagnostic().contains("transaction (base58)"));
}

#[tokio::test]
async fn cancelled_token_stops_before_any_io() {
    let (world, signer, _) = setup(false);
    let service = world.service(signer);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service
        .mint(mint_request(13, vec![payer_creator()]), &cancel)
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Cancelled);
    assert_eq!(world.primary.send_count(), 0);
}

#[tokio::test]
async fn invalid_request_fails_fast() {
    let (world, signer, _) = setup(false);
    let service = world.service(signer);
    let mut request = mint_request(14, vec![payer_creator()]);
    request.metadata_symbol = "WAY-TOO-LONG".into();

    let err = service.mint(request, &CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::InvalidInput(_));
    assert_eq!(world.primary.blockhash_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pending_status_is_polled_until_confirmed() {
    let (world, signer, _) = setup(false);
    world.primary.script_status([Ok(SignatureStatus::Pending)]);
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(15, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.submission.confirmed);
    assert_eq!(world.primary.status_calls(), 2);
    assert_eq!(world.primary.send_count(), 1);
}

#[tokio::test]
async fn never_confirmed_is_accepted_without_resubmitting() {
    let (mut world, signer, _) = setup(false);
    world.config.confirmation.poll_attempts = 3;
    world.primary.script_status((0..3).map(|_| Ok(SignatureStatus::Pending)));
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(16, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();
    assert!(!outcome.submission.confirmed);
    assert_eq!(outcome.submission.attempts, 1);
    assert_eq!(world.primary.status_calls(), 3);
    assert_eq!(world.primary.send_count(), 1);
}

#[tokio::test]
async fn guard_rail_code_only_in_raw_response_is_recognised() {
    let (world, signer, _) = setup(false);
    world.primary.script([Err(RpcFailure::rejected("Transaction simulation failed", None)
        .with_raw("Program log: AnchorError occurred. custom program error: 0x63"))]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(17, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::CollectionAuthorityMismatch { .. },
            transaction: Some(_),
        }
    );
}

#[tokio::test]
async fn creator_code_only_in_raw_response_triggers_downgrade() {
    let (world, signer, payer) = setup(false);
    world.primary.script([Err(RpcFailure::rejected("Transaction simulation failed", None)
        .with_raw("Program log: custom program error: 0x178f"))]);
    let service = world.service(signer);

    let outcome = service
        .mint(mint_request(18, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.submission.creators_downgraded, vec![payer]);
    assert_eq!(world.primary.send_count(), 2);
}

#[tokio::test]
async fn consecutive_mints_reuse_the_cached_blockhash() {
    let (world, signer, _) = setup(false);
    let service = world.service(signer);
    let cancel = CancellationToken::new();

    service.mint(mint_request(19, vec![payer_creator()]), &cancel).await.unwrap();
    service.mint(mint_request(20, vec![payer_creator()]), &cancel).await.unwrap();

    assert_eq!(world.primary.blockhash_calls(), 1);
    let sent = world.primary.sent();
    assert_eq!(sent[0].message.recent_blockhash, sent[1].message.recent_blockhash);
}

#[tokio::test]
async fn expired_blockhash_is_evicted_for_the_next_submission() {
    let (mut world, signer, _) = setup(false);
    world.config.retry.max_retries = 0;
    world
        .primary
        .script([Err(RpcFailure::blockhash_not_found("Blockhash not found"))]);
    let service = world.service(signer);
    let cancel = CancellationToken::new();

    let err = service
        .mint(mint_request(21, vec![payer_creator()]), &cancel)
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::TransportExhausted { attempts: 1, .. });

    service.mint(mint_request(22, vec![payer_creator()]), &cancel).await.unwrap();
    assert_eq!(world.primary.blockhash_calls(), 2);
    let sent = world.primary.sent();
    assert_ne!(sent[0].message.recent_blockhash, sent[1].message.recent_blockhash);
}

#[tokio::test]
async fn plain_transport_failure_keeps_the_cached_blockhash() {
    let (mut world, signer, _) = setup(false);
    world.config.retry.max_retries = 0;
    world.primary.script([Err(RpcFailure::transport("timed out"))]);
    let service = world.service(signer);
    let cancel = CancellationToken::new();

    service
        .mint(mint_request(23, vec![payer_creator()]), &cancel)
        .await
        .unwrap_err();
    service.mint(mint_request(24, vec![payer_creator()]), &cancel).await.unwrap();
    assert_eq!(world.primary.blockhash_calls(), 1);
}

#[tokio::test]
async fn authority_override_stands_in_for_the_registry_authority() {
    let payer = Keypair::new();
    let override_key = Keypair::new();
    let mut world = World::new(&payer, false);
    world.authority = Pubkey::new_unique();
    world.set_registry(false);
    world.config.authority_override = Some(override_key.pubkey());
    let (payer_key, override_pubkey) = (payer.pubkey(), override_key.pubkey());
    let service = world.service(KeypairSigner::new(payer).with_cosigner(override_key));

    let outcome = service
        .mint(mint_request(25, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.submission.signers, vec![payer_key, override_pubkey]);

    let tx = &world.primary.sent()[0];
    assert_eq!(tx.message.header.num_required_signatures, 2);
    assert!(tx.signatures.iter().all(|s| *s != Signature::default()));
    let keys = &tx.message.account_keys;
    let at = keys.iter().position(|k| *k == override_pubkey).unwrap();
    assert!(tx.message.is_signer(at));
    assert!(!keys.contains(&world.authority));
}

#[tokio::test]
async fn mint_without_authority_key_is_signed_by_the_payer_alone() {
    let payer = Keypair::new();
    let mut world = World::new(&payer, false);
    world.authority = Pubkey::new_unique();
    world.set_registry(false);
    let payer_key = payer.pubkey();
    let service = world.service(KeypairSigner::new(payer));

    let outcome = service
        .mint(mint_request(26, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.submission.signers, vec![payer_key]);
    assert_eq!(world.primary.sent()[0].message.header.num_required_signatures, 1);
}

#[tokio::test]
async fn guard_rail_code_survives_a_failed_collection_reread() {
    let (world, signer, _) = setup(false);
    world.primary.reads_fail_after_send.store(true, std::sync::atomic::Ordering::SeqCst);
    world
        .primary
        .script([Err(RpcFailure::rejected("custom program error: 0x63", Some(0x63)))]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(27, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::CollectionAuthorityMismatch { expected, .. },
            transaction: Some(_),
        } if expected == world.pdas.auth.address
    );
}

#[tokio::test]
async fn uniqueness_code_with_failed_reread_names_the_edition_rail() {
    let (world, signer, _) = setup(false);
    world.primary.reads_fail_after_send.store(true, std::sync::atomic::Ordering::SeqCst);
    world
        .primary
        .script([Err(RpcFailure::rejected("custom program error: 0x65", Some(0x65)))]);
    let service = world.service(signer);

    let err = service
        .mint(mint_request(28, vec![payer_creator()]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::CollectionGuardRailViolation {
            violation: GuardRailViolation::MasterEditionNotUnique { max_supply: None, .. },
            transaction: Some(_),
        }
    );
}
