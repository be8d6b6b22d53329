pub mod model;
pub mod password;
pub mod validation;

pub use model::{BankLinkData, CardData, RegistrationRecord, SelectedAmount, UserProfile};
pub use password::{PasswordRequirements, PasswordStrength, StrengthLevel};
