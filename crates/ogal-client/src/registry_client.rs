//! Instruction builders for the registry program.
//!
//! Account metas are emitted in the order the program declares them. Signer
//! flags set here are the program's minimum; the assembler adds any other key
//! in the signer set.

use ogal_core::creators::Creator;
use ogal_core::instruction::RegistryInstruction;
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::{system_program, sysvar};

use crate::constants::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_METADATA_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::pda::{CollectionPdas, ObjectPdas, RegistryPdas};

/// Metadata fields sent with a mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintArgs {
    pub manifest_uri: String,
    pub manifest_hash: [u8; 32],
    pub metadata_name: String,
    pub metadata_symbol: String,
    pub seller_fee_basis_points: u16,
}

/// Accounts of a mint besides the derived registry and object PDAs.
#[derive(Debug, Clone, Copy)]
pub struct MintAccounts {
    pub authority: Pubkey,
    pub payer: Pubkey,
    pub recipient: Pubkey,
    pub recipient_token_account: Pubkey,
    pub collection: CollectionPdas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryClient {
    pub program_id: Pubkey,
}

impl RegistryClient {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    fn instruction(&self, payload: &RegistryInstruction, accounts: Vec<AccountMeta>) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts,
            data: payload.to_vec(),
        }
    }

    pub fn ix_mint_object(
        &self,
        registry: &RegistryPdas,
        object: &ObjectPdas,
        accounts: &MintAccounts,
        args: &MintArgs,
        creators: &[Creator],
    ) -> Instruction {
        let payload = RegistryInstruction::MintObjectNft {
            object_id: object.object_id,
            manifest_uri: args.manifest_uri.clone(),
            manifest_hash: args.manifest_hash,
            metadata_name: args.metadata_name.clone(),
            metadata_symbol: args.metadata_symbol.clone(),
            seller_fee_basis_points: args.seller_fee_basis_points,
            creators: creators.to_vec(),
        };

        let mut metas = vec![
            AccountMeta::new_readonly(accounts.authority, false),
            AccountMeta::new(registry.config.address, false),
            AccountMeta::new(registry.auth.address, false),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new(object.manifest.address, false),
            AccountMeta::new(object.mint.address, false),
            AccountMeta::new(accounts.recipient_token_account, false),
            AccountMeta::new_readonly(accounts.recipient, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new(object.metadata, false),
            AccountMeta::new(object.master_edition, false),
            AccountMeta::new_readonly(accounts.collection.mint, false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            // remaining accounts
            AccountMeta::new(accounts.collection.metadata, false),
            AccountMeta::new(accounts.collection.master_edition, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(sysvar::instructions::id(), false),
        ];
        metas.extend(
            creators
                .iter()
                .map(|c| AccountMeta::new_readonly(c.address, c.verified)),
        );

        self.instruction(&payload, metas)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ix_update_manifest(
        &self,
        registry: &RegistryPdas,
        object: &ObjectPdas,
        owner: &Pubkey,
        owner_token_account: &Pubkey,
        manifest_hash: [u8; 32],
        metadata_uri: &str,
        is_active: bool,
    ) -> Instruction {
        let payload = RegistryInstruction::UpdateObjectManifest {
            manifest_hash,
            metadata_uri: metadata_uri.to_string(),
            is_active,
        };
        self.instruction(
            &payload,
            vec![
                AccountMeta::new(*owner, true),
                AccountMeta::new(registry.config.address, false),
                AccountMeta::new_readonly(registry.auth.address, false),
                AccountMeta::new(object.manifest.address, false),
                AccountMeta::new_readonly(object.mint.address, false),
                AccountMeta::new_readonly(*owner_token_account, false),
                AccountMeta::new(object.metadata, false),
                AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
                AccountMeta::new_readonly(sysvar::rent::id(), false),
                AccountMeta::new_readonly(sysvar::instructions::id(), false),
            ],
        )
    }

    pub fn ix_set_authority(&self, registry: &RegistryPdas, authority: &Pubkey, new_authority: Pubkey) -> Instruction {
        self.instruction(
            &RegistryInstruction::SetAuthority { new_authority },
            admin_metas(registry, authority),
        )
    }

    pub fn ix_set_paused(&self, registry: &RegistryPdas, authority: &Pubkey, paused: bool) -> Instruction {
        self.instruction(
            &RegistryInstruction::SetPaused { paused },
            admin_metas(registry, authority),
        )
    }

    /// `to` must be derived from the new namespace.
    pub fn ix_migrate_namespace(&self, from: &RegistryPdas, to: &RegistryPdas, authority: &Pubkey) -> Instruction {
        self.instruction(
            &RegistryInstruction::MigrateConfigNamespace {
                new_namespace: to.namespace,
            },
            vec![
                AccountMeta::new(*authority, true),
                AccountMeta::new(from.config.address, false),
                AccountMeta::new(to.config.address, false),
                AccountMeta::new_readonly(from.auth.address, false),
                AccountMeta::new(to.auth.address, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        )
    }

    pub fn ix_rotate_collection_authority(
        &self,
        registry: &RegistryPdas,
        authority: &Pubkey,
        collection: &CollectionPdas,
        new_update_authority: Pubkey,
    ) -> Instruction {
        self.instruction(
            &RegistryInstruction::RotateCollectionAuthority { new_update_authority },
            vec![
                AccountMeta::new_readonly(*authority, true),
                AccountMeta::new(registry.config.address, false),
                AccountMeta::new_readonly(registry.auth.address, false),
                AccountMeta::new(collection.metadata, false),
                AccountMeta::new_readonly(collection.mint, false),
                AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            ],
        )
    }
}

fn admin_metas(registry: &RegistryPdas, authority: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(registry.config.address, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pda::{derive_associated_token_account, ExpectedBumps};

    fn registry() -> RegistryPdas {
        RegistryPdas::derive(&Pubkey::new_unique(), &Pubkey::new_unique(), &ExpectedBumps::default())
            .unwrap()
    }

    fn args() -> MintArgs {
        MintArgs {
            manifest_uri: "ipfs://m".into(),
            manifest_hash: [1; 32],
            metadata_name: "N".into(),
            metadata_symbol: "S".into(),
            seller_fee_basis_points: 250,
        }
    }

    #[test]
    fn mint_accounts_follow_program_order() {
        let reg = registry();
        let obj = reg.object(11, &ExpectedBumps::default()).unwrap();
        let payer = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let ata = derive_associated_token_account(&recipient, &obj.mint.address).unwrap().address;
        let collection = CollectionPdas::derive(&Pubkey::new_unique()).unwrap();
        let accounts = MintAccounts {
            authority: Pubkey::new_unique(),
            payer,
            recipient,
            recipient_token_account: ata,
            collection,
        };
        let artist = Pubkey::new_unique();
        let creators = [
            Creator { address: payer, verified: true, share: 70 },
            Creator { address: artist, verified: false, share: 30 },
        ];

        let ix = RegistryClient::new(reg.program_id).ix_mint_object(&reg, &obj, &accounts, &args(), &creators);
        assert_eq!(ix.program_id, reg.program_id);
        assert_eq!(ix.accounts.len(), 19 + creators.len());

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(keys[0], accounts.authority);
        assert_eq!(keys[1], reg.config.address);
        assert_eq!(keys[3], payer);
        assert_eq!(keys[6], ata);
        assert_eq!(keys[13], collection.mint);
        assert_eq!(keys[15], collection.metadata);
        assert_eq!(keys[16], collection.master_edition);
        assert_eq!(keys[18], sysvar::instructions::id());
        assert_eq!(&keys[19..], &[payer, artist]);

        assert!(!ix.accounts[0].is_signer && !ix.accounts[0].is_writable);
        assert!(ix.accounts[3].is_signer && ix.accounts[3].is_writable);
        assert!(ix.accounts[19].is_signer && !ix.accounts[19].is_writable);
        assert!(!ix.accounts[20].is_signer);

        match RegistryInstruction::from_slice(&ix.data).unwrap() {
            RegistryInstruction::MintObjectNft { object_id, creators: sent, .. } => {
                assert_eq!(object_id, 11);
                assert_eq!(sent, creators.to_vec());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn admin_instructions_require_authority_signature() {
        let reg = registry();
        let authority = Pubkey::new_unique();
        let client = RegistryClient::new(reg.program_id);
        for ix in [
            client.ix_set_paused(&reg, &authority, true),
            client.ix_set_authority(&reg, &authority, Pubkey::new_unique()),
        ] {
            assert_eq!(ix.accounts.len(), 2);
            assert!(ix.accounts[0].is_signer);
            assert!(ix.accounts[1].is_writable);
        }
        assert_eq!(
            RegistryInstruction::from_slice(&client.ix_set_paused(&reg, &authority, true).data).unwrap(),
            RegistryInstruction::SetPaused { paused: true }
        );
    }

    #[test]
    fn migrate_targets_new_namespace_pdas() {
        let from = registry();
        let to = RegistryPdas::derive(&from.program_id, &Pubkey::new_unique(), &ExpectedBumps::default())
            .unwrap();
        let authority = Pubkey::new_unique();
        let ix = RegistryClient::new(from.program_id).ix_migrate_namespace(&from, &to, &authority);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                authority,
                from.config.address,
                to.config.address,
                from.auth.address,
                to.auth.address,
                system_program::id()
            ]
        );
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(
            RegistryInstruction::from_slice(&ix.data).unwrap(),
            RegistryInstruction::MigrateConfigNamespace { new_namespace: to.namespace }
        );
    }

    #[test]
    fn update_and_rotate_layouts() {
        let reg = registry();
        let obj = reg.object(2, &ExpectedBumps::default()).unwrap();
        let owner = Pubkey::new_unique();
        let client = RegistryClient::new(reg.program_id);

        let ix = client.ix_update_manifest(&reg, &obj, &owner, &Pubkey::new_unique(), [3; 32], "ipfs://x", false);
        assert_eq!(ix.accounts.len(), 10);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[3].pubkey, obj.manifest.address);
        assert_eq!(ix.accounts[6].pubkey, obj.metadata);

        let collection = CollectionPdas::derive(&Pubkey::new_unique()).unwrap();
        let ix = client.ix_rotate_collection_authority(&reg, &owner, &collection, Pubkey::new_unique());
        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[3].pubkey, collection.metadata);
        assert!(ix.accounts[3].is_writable);
    }
}
