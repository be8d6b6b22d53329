use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Contraseña débil",
            Self::Fair => "Contraseña regular",
            Self::Good => "Contraseña buena",
            Self::Strong => "Contraseña muy segura",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub length: bool,
    pub upper: bool,
    pub lower: bool,
    pub number: bool,
    pub special: bool,
}

impl PasswordRequirements {
    pub fn met(&self) -> usize {
        [self.length, self.upper, self.lower, self.number, self.special]
            .iter()
            .filter(|met| **met)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub level: StrengthLevel,
    pub requirements: PasswordRequirements,
}

const SPECIAL: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

impl PasswordStrength {
    /// Minimum score accepted at registration.
    pub const MIN_ACCEPTED_SCORE: u8 = 2;

    pub fn evaluate(password: &str) -> Self {
        let requirements = PasswordRequirements {
            length: password.chars().count() >= 8,
            upper: password.chars().any(|c| c.is_ascii_uppercase()),
            lower: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| SPECIAL.contains(c)),
        };

        let (score, level) = match requirements.met() {
            0 | 1 => (1, StrengthLevel::Weak),
            2 => (2, StrengthLevel::Fair),
            3 | 4 => (3, StrengthLevel::Good),
            _ => (4, StrengthLevel::Strong),
        };

        Self {
            score,
            level,
            requirements,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        self.score >= Self::MIN_ACCEPTED_SCORE
    }
}
