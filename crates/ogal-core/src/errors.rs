//! Error types for ogal-core.
//!
//! Everything in this crate operates on bytes handed over by a caller, so the
//! taxonomy is small: malformed input and undecodable account data. Guard-rail
//! outcomes live in [`crate::collection::GuardRailViolation`].

use solana_program::pubkey::Pubkey;

/// Result alias used throughout the core crate.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("truncated data: needed {needed} byte(s) at offset {offset}, {remaining} remaining")]
    TruncatedData {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("discriminator mismatch for {account}: expected {expected}, found {found}")]
    DiscriminatorMismatch {
        account: &'static str,
        expected: String,
        found: String,
    },

    #[error("owner mismatch: expected {expected}, found {found}")]
    OwnerMismatch { expected: Pubkey, found: Pubkey },

    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag { tag: u8, offset: usize },

    #[error("invalid bool byte {value} at offset {offset}")]
    InvalidBool { value: u8, offset: usize },

    #[error("invalid utf-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors caused by account bytes rather than caller input.
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, Self::InvalidArgument(_))
    }
}

/// Anchor custom error codes emitted by the registry program.
///
/// Anchor numbers user errors from 6000 in declaration order; the order below
/// must track the program's `ErrorCode` enum exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ProgramErrorCode {
    InvalidAuthority = 6000,
    UriTooLong,
    ObjectInactive,
    ManifestNotInitialized,
    ObjectIdMismatch,
    InvalidConfig,
    InvalidManifestAccount,
    ManifestAccountTooSmall,
    InvalidObjectMintAccount,
    MintMismatch,
    InvalidOwnerTokenAccount,
    OwnerDoesNotHoldObjectNft,
    ManifestMismatch,
    RecipientMismatch,
    UnauthorizedDeployer,
    MintingPaused,
    MetadataNameTooLong,
    MetadataSymbolTooLong,
    InvalidCreatorShareDistribution,
    TooManyCreators,
    InvalidSellerFeeBasisPoints,
    InvalidTokenMetadataProgram,
    MissingMintMetadataAccounts,
    InvalidRentSysvar,
    InvalidMetadataAccount,
    InvalidMasterEditionAccount,
    InvalidCollectionMetadataAccount,
    InvalidCollectionMasterEditionAccount,
    InvalidInstructionsSysvar,
    MissingManifestCreator,
    InvalidRecipientTokenAccount,
    CreatorMustSign,
}

impl ProgramErrorCode {
    const ALL: [ProgramErrorCode; 32] = [
        Self::InvalidAuthority,
        Self::UriTooLong,
        Self::ObjectInactive,
        Self::ManifestNotInitialized,
        Self::ObjectIdMismatch,
        Self::InvalidConfig,
        Self::InvalidManifestAccount,
        Self::ManifestAccountTooSmall,
        Self::InvalidObjectMintAccount,
        Self::MintMismatch,
        Self::InvalidOwnerTokenAccount,
        Self::OwnerDoesNotHoldObjectNft,
        Self::ManifestMismatch,
        Self::RecipientMismatch,
        Self::UnauthorizedDeployer,
        Self::MintingPaused,
        Self::MetadataNameTooLong,
        Self::MetadataSymbolTooLong,
        Self::InvalidCreatorShareDistribution,
        Self::TooManyCreators,
        Self::InvalidSellerFeeBasisPoints,
        Self::InvalidTokenMetadataProgram,
        Self::MissingMintMetadataAccounts,
        Self::InvalidRentSysvar,
        Self::InvalidMetadataAccount,
        Self::InvalidMasterEditionAccount,
        Self::InvalidCollectionMetadataAccount,
        Self::InvalidCollectionMasterEditionAccount,
        Self::InvalidInstructionsSysvar,
        Self::MissingManifestCreator,
        Self::InvalidRecipientTokenAccount,
        Self::CreatorMustSign,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let idx = code.checked_sub(Self::InvalidAuthority.code())?;
        Self::ALL.get(idx as usize).copied()
    }

    /// Message the program attaches to the error.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidAuthority => "The provided authority does not match the configuration authority.",
            Self::UriTooLong => "Manifest metadata URI exceeds the permitted length.",
            Self::ObjectInactive => "The requested object is currently inactive.",
            Self::ManifestNotInitialized => "The object manifest has not been initialized yet.",
            Self::ObjectIdMismatch => "The supplied object identifier does not match the stored manifest.",
            Self::InvalidConfig => "The manifest is associated with a different configuration account.",
            Self::InvalidManifestAccount => "The supplied manifest account does not match the expected address.",
            Self::ManifestAccountTooSmall => "The manifest account data is too small to store the object manifest.",
            Self::InvalidObjectMintAccount => "The supplied object mint account does not match the expected address.",
            Self::MintMismatch => "The mint provided does not match the stored mint for this object.",
            Self::InvalidOwnerTokenAccount => "The provided token account does not belong to the connected signer.",
            Self::OwnerDoesNotHoldObjectNft => "The connected wallet must hold the object NFT to perform this action.",
            Self::ManifestMismatch => "The supplied manifest metadata does not match the stored value.",
            Self::RecipientMismatch => "The recipient token account does not belong to the supplied recipient.",
            Self::UnauthorizedDeployer => "The signer is not authorized to deploy the object registry.",
            Self::MintingPaused => "Minting has been paused by the registry authority.",
            Self::MetadataNameTooLong => "Metadata name exceeds the allowed length.",
            Self::MetadataSymbolTooLong => "Metadata symbol exceeds the allowed length.",
            Self::InvalidCreatorShareDistribution => "Invalid metadata creator share distribution.",
            Self::TooManyCreators => "Too many metadata creators supplied.",
            Self::InvalidSellerFeeBasisPoints => "Seller fee basis points exceed the permitted maximum.",
            Self::InvalidTokenMetadataProgram => "The provided token metadata program is invalid.",
            Self::MissingMintMetadataAccounts => "Insufficient remaining accounts supplied for metadata validation.",
            Self::InvalidRentSysvar => "The provided rent sysvar account is invalid.",
            Self::InvalidMetadataAccount => "Metadata account does not match the expected address.",
            Self::InvalidMasterEditionAccount => "Master edition account does not match the expected address.",
            Self::InvalidCollectionMetadataAccount => "Collection metadata account does not match the expected address.",
            Self::InvalidCollectionMasterEditionAccount => "Collection master edition account does not match the expected address.",
            Self::InvalidInstructionsSysvar => "The provided instructions sysvar account is invalid.",
            Self::MissingManifestCreator => "Metadata creators must include the recorded object creator.",
            Self::InvalidRecipientTokenAccount => "The supplied recipient token account does not match the expected address.",
            Self::CreatorMustSign => "All verified metadata creators must sign the transaction.",
        }
    }
}
