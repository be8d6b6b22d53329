pub mod concept;
pub mod model;

pub use concept::ConceptMatcher;
pub use model::{
    BankTransferRequest, CardDetails, CardPaymentRequest, MobilePaymentRequest, Receipt,
    ReconcileOutcome, Submission,
};
