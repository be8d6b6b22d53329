pub mod ledger;
pub mod model;

pub use ledger::Ledger;
pub use model::{
    BalanceSnapshot, PaymentMethod, Transaction, TransactionKind, TransactionStatus,
    TransferIntent,
};
