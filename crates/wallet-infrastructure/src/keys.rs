//! Storage key catalog.
//!
//! Names match the ones the browser build used so an exported storage dump
//! can be replayed.

/// Durable (local) storage keys.
pub mod durable {
    pub const USER_DATA: &str = "remeexUserData_v4";
    pub const BALANCE: &str = "remeexBalance_v4";
    pub const BALANCE_BACKUP: &str = "remeexBalance_v4_backup";
    pub const TRANSACTIONS: &str = "remeexTransactions_v4";
    pub const PENDING_BANK_TRANSFERS: &str = "remeexPendingBankTransfers_v4";
    pub const VERIFICATION_STATUS: &str = "remeexVerificationStatus_v4";
    pub const CARD_DATA: &str = "remeexCardData_v4";
    pub const HAS_MADE_FIRST_RECHARGE: &str = "remeexHasMadeFirstRecharge_v4";
    pub const DEVICE_ID: &str = "remeexDeviceId_v4";
    pub const USER_REGISTRATION: &str = "remeexUserRegistration_v4";
    pub const IS_REGISTERED: &str = "remeexIsRegistered_v4";
    pub const EVOLUTION_STATE: &str = "remeex_evolution_state_v4";
    pub const PROCESSING_START: &str = "remeex_processing_start_v4";
    pub const BANK_DATA: &str = "remeex_bank_data_v4";
    pub const LAST_INTERACTION: &str = "remeex_last_interaction_v4";
    pub const LAST_RECHARGE_TIME: &str = "remeexLastRechargeTime";
    pub const LAST_VERIFICATION_TIME: &str = "remeexLastVerificationTime";
    pub const LAST_EXTERNAL_VERIFICATION_CHECK: &str = "remeexLastExternalVerificationCheck";

    /// Written by the external identity/bank verification flow.
    pub const VERIFICATION_BANKING: &str = "remeexVerificationBanking";
    /// Written by the external bank-validation flow.
    pub const BANK_VALIDATION_DATA: &str = "remeexBankValidationData";

    /// Checksummed records, the candidates for corruption purging.
    pub const CHECKSUMMED: [&str; 8] = [
        USER_DATA,
        BALANCE,
        TRANSACTIONS,
        PENDING_BANK_TRANSFERS,
        VERIFICATION_STATUS,
        USER_REGISTRATION,
        CARD_DATA,
        BANK_DATA,
    ];
}

/// Session-scoped keys.
pub mod session {
    pub const ACTIVE: &str = "remeexSession";
    pub const USER: &str = "remeexUser";
    pub const BALANCE: &str = "remeexSessionBalance";
    pub const EXCHANGE_RATE: &str = "remeexSessionExchangeRate";
    pub const DEVICE_ID: &str = "remeexDeviceId";
    pub const CROSS_PAGE: &str = "remeexCrossPageSession";
    pub const INTERNAL_NAVIGATION: &str = "remeexInternalNavigation";
    pub const TRANSFER_DATA: &str = "remeexTransferData";

    pub const ALL: [&str; 8] = [
        ACTIVE,
        USER,
        BALANCE,
        EXCHANGE_RATE,
        DEVICE_ID,
        CROSS_PAGE,
        INTERNAL_NAVIGATION,
        TRANSFER_DATA,
    ];
}
