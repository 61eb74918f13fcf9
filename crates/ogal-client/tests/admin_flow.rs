mod common;

use assert_matches::assert_matches;
use common::*;
use ogal_client::pda::RegistryPdas;
use ogal_client::{CancellationToken, KeypairSigner, LedgerError, UpdateManifestRequest};
use ogal_core::instruction::RegistryInstruction;
use ogal_core::state::{ObjectManifest, ProgramAccount, RegistryConfig};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

#[tokio::test]
async fn fetch_config_decodes_registry() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));

    let view = service.fetch_config(&CancellationToken::new()).await.unwrap();
    assert_eq!(view.address, world.pdas.config.address);
    assert_eq!(view.auth, world.pdas.auth.address);
    assert_eq!(view.config.authority, world.authority);
    assert!(!view.config.paused);
}

#[tokio::test]
async fn fetch_config_decodes_the_auth_record() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));
    let cancel = CancellationToken::new();

    assert_eq!(service.fetch_config(&cancel).await.unwrap().auth_record, None);

    let record = world.set_auth_record();
    let view = service.fetch_config(&cancel).await.unwrap();
    assert_eq!(view.auth_record, Some(record));
    assert_eq!(view.auth_record.unwrap().config, world.pdas.config.address);
}

#[tokio::test]
async fn auth_record_owned_by_another_program_is_a_decode_error() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let record = world.set_auth_record();
    world
        .primary
        .put(world.pdas.auth.address, Pubkey::new_unique(), record.encode_account());
    let service = world.service(KeypairSigner::new(payer));

    let err = service.fetch_config(&CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::Core(ogal_core::errors::CoreError::OwnerMismatch { .. }));
}

#[tokio::test]
async fn recorded_bump_must_match_derivation() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let wrong = RegistryConfig {
        authority: world.authority,
        config_bump: world.pdas.config.bump.wrapping_sub(1),
        auth_bump: world.pdas.auth.bump,
        object_count: 0,
        namespace: world.namespace,
        paused: false,
    };
    world
        .primary
        .put(world.pdas.config.address, world.program_id, wrong.encode_account());
    let service = world.service(KeypairSigner::new(payer));

    let err = service.fetch_config(&CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::BumpMismatch { ref label, .. } if label == "config");
}

#[tokio::test]
async fn config_owned_by_another_program_is_a_decode_error() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let cfg = RegistryConfig {
        authority: world.authority,
        config_bump: world.pdas.config.bump,
        auth_bump: world.pdas.auth.bump,
        object_count: 0,
        namespace: world.namespace,
        paused: false,
    };
    world
        .primary
        .put(world.pdas.config.address, Pubkey::new_unique(), cfg.encode_account());
    let service = world.service(KeypairSigner::new(payer));

    let err = service.fetch_config(&CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::Core(_));
}

#[tokio::test]
async fn missing_manifest_is_reported() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));

    let err = service.fetch_manifest(42, &CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::AccountNotFound { .. });
}

#[tokio::test]
async fn set_paused_is_signed_by_the_authority() {
    let payer = Keypair::new();
    let authority = payer.pubkey();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));

    let outcome = service.set_paused(true, &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.operation, "set_paused");
    assert_eq!(outcome.target, world.pdas.config.address);

    let tx = &world.primary.sent()[0];
    assert_eq!(tx.message.account_keys[0], authority);
    assert_eq!(tx.message.header.num_required_signatures, 1);
    assert_eq!(
        registry_instruction(tx, &world.program_id),
        RegistryInstruction::SetPaused { paused: true }
    );
}

#[tokio::test]
async fn separate_authority_cosigns_admin_operations() {
    let payer = Keypair::new();
    let admin = Keypair::new();
    let mut world = World::new(&payer, false);
    world.authority = admin.pubkey();
    world.set_registry(false);
    let admin_key = admin.pubkey();
    let service = world.service(KeypairSigner::new(payer).with_cosigner(admin));

    let new_authority = Pubkey::new_unique();
    service
        .set_authority(new_authority, &CancellationToken::new())
        .await
        .unwrap();

    let tx = &world.primary.sent()[0];
    assert_eq!(tx.message.header.num_required_signatures, 2);
    assert_eq!(tx.message.account_keys[1], admin_key);
    assert!(tx.signatures.iter().all(|s| *s != Signature::default()));
    assert_eq!(
        registry_instruction(tx, &world.program_id),
        RegistryInstruction::SetAuthority { new_authority }
    );
}

#[tokio::test]
async fn admin_operations_need_the_authority_key() {
    let payer = Keypair::new();
    let mut world = World::new(&payer, false);
    world.authority = Pubkey::new_unique();
    world.set_registry(false);
    let service = world.service(KeypairSigner::new(payer));

    let err = service.set_paused(true, &CancellationToken::new()).await.unwrap_err();
    assert_matches!(err, LedgerError::NotReady(_));
    assert_eq!(world.primary.send_count(), 0);
}

#[tokio::test]
async fn migrate_targets_the_new_namespace() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));
    let new_namespace = Pubkey::new_unique();

    let outcome = service
        .migrate_namespace(new_namespace, &CancellationToken::new())
        .await
        .unwrap();
    let expected = RegistryPdas::derive(&world.program_id, &new_namespace, &Default::default()).unwrap();
    assert_eq!(outcome.target, expected.config.address);

    let err = service
        .migrate_namespace(world.namespace, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::InvalidInput(_));
}

#[tokio::test]
async fn rotate_collection_authority_points_at_collection_metadata() {
    let payer = Keypair::new();
    let world = World::new(&payer, false);
    let service = world.service(KeypairSigner::new(payer));
    let next = Pubkey::new_unique();

    let outcome = service
        .rotate_collection_authority(next, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.target, world.collection.metadata);
    assert_eq!(
        registry_instruction(&world.primary.sent()[0], &world.program_id),
        RegistryInstruction::RotateCollectionAuthority { new_update_authority: next }
    );
}

#[tokio::test]
async fn update_manifest_reads_the_existing_manifest() {
    let payer = Keypair::new();
    let owner = payer.pubkey();
    let world = World::new(&payer, false);
    let object = world.pdas.object(5, &Default::default()).unwrap();
    let manifest = ObjectManifest {
        config: world.pdas.config.address,
        object_id: 5,
        mint: object.mint.address,
        bump: object.manifest.bump,
        mint_bump: object.mint.bump,
        is_active: true,
        minted: true,
        initialized: true,
        manifest_hash: [1; 32],
        metadata_uri: "ipfs://old".into(),
        creator: owner,
    };
    world
        .primary
        .put(object.manifest.address, world.program_id, manifest.encode_account());
    let service = world.service(KeypairSigner::new(payer));

    let view = service.fetch_manifest(5, &CancellationToken::new()).await.unwrap();
    assert_eq!(view.manifest, manifest);

    let outcome = service
        .update_manifest(
            UpdateManifestRequest {
                object_id: 5,
                manifest_hash: [2; 32],
                metadata_uri: "ipfs://new".into(),
                is_active: true,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.manifest, object.manifest.address);
    assert_eq!(
        registry_instruction(&world.primary.sent()[0], &world.program_id),
        RegistryInstruction::UpdateObjectManifest {
            manifest_hash: [2; 32],
            metadata_uri: "ipfs://new".into(),
            is_active: true,
        }
    );
}
