use wallet_core::storage::{KeyValueMedium, MediumError};

/// A medium that refuses every operation, like storage blocked by the host.
#[derive(Debug, Clone, Default)]
pub struct UnavailableMedium;

impl UnavailableMedium {
    fn refuse() -> MediumError {
        MediumError::Unavailable("storage disabled by host".to_string())
    }
}

impl KeyValueMedium for UnavailableMedium {
    fn get(&self, _key: &str) -> Result<Option<String>, MediumError> {
        Err(Self::refuse())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), MediumError> {
        Err(Self::refuse())
    }

    fn remove(&self, _key: &str) -> Result<(), MediumError> {
        Err(Self::refuse())
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        Err(Self::refuse())
    }
}
