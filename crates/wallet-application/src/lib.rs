//! Application layer of the wallet simulation.
//!
//! Services here are stateless; each operates on the explicit
//! [`WalletContext`] passed to it. [`WalletEngine`] bundles them behind one
//! facade and [`WalletRuntime`] hosts that facade on tokio.

pub mod auth;
pub mod context;
pub mod engine;
pub mod events;
pub mod evolution;
pub mod ledger;
pub mod payment;
pub mod runtime;
pub mod sync;
pub mod verification;
pub mod watchdog;

pub use auth::{AuthService, RegistrationForm, SessionUser};
pub use context::{DomainState, WalletContext};
pub use engine::{SystemStats, WalletEngine};
pub use events::EventBus;
pub use evolution::EvolutionManager;
pub use ledger::LedgerManager;
pub use runtime::WalletRuntime;
pub use sync::{CrossPageSnapshot, CrossPageSync};
pub use verification::{VerificationMonitor, VerificationService};
pub use watchdog::InactivityWatchdog;
