//! ogal-core
//!
//! I/O-free primitives for the owner-governed asset ledger client:
//! - bounds-checked byte codec and discriminators
//! - registry account layouts and instruction payloads
//! - token-metadata collection decoding and pre-mint guard rails
//! - creator reconciliation

pub mod codec;
pub mod collection;
pub mod creators;
pub mod errors;
pub mod hashing;
pub mod instruction;
pub mod serde_pubkey;
pub mod state;

pub use crate::errors::{CoreError, CoreResult, ProgramErrorCode};

/// Limits the program enforces on mint and update arguments.
pub mod limits {
    pub const MAX_URI_LEN: usize = crate::state::MAX_MANIFEST_URI_LEN;
    pub const MAX_NAME_LEN: usize = 32;
    pub const MAX_SYMBOL_LEN: usize = 10;
    pub const MAX_SELLER_FEE_BASIS_POINTS: u16 = 10_000;
    pub const MAX_CREATORS: usize = crate::creators::MAX_CREATORS;
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
    pub use crate::collection::{
        check_collection_authority, check_master_edition_unique, evaluate_guard_rails, AccountRef,
        CollectionMetadataInfo, CollectionSizing, GuardRailReport, GuardRailViolation,
        MasterEditionInfo,
    };
    pub use crate::creators::{
        downgrade, downgrade_all, sanitize_creators, Creator, CreatorError, CreatorRequest,
        SanitizedCreators,
    };
    pub use crate::hashing::{account_discriminator, instruction_discriminator, manifest_hash};
    pub use crate::instruction::RegistryInstruction;
    pub use crate::state::{AuthRecord, ObjectManifest, ProgramAccount, RegistryConfig};
    pub use crate::{CoreError, CoreResult, ProgramErrorCode};
}
