use crate::config::DocumentStageConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvolutionStage {
    #[default]
    FirstRecharge,
    NeedsVerification,
    ProcessingDocs,
    ReadyForBanking,
    BankingValidated,
    FirstMobilePayment,
}

/// The document-processing window opened when verification completes.
///
/// Always evaluated from the stored start timestamp, so the outcome is the
/// same whether or not a live timer survived a restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingWindow {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ProcessingWindow {
    pub fn new(started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    /// Elapsed time, clamped at zero for clocks that moved backwards.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.elapsed(now) < self.duration
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn progress_percent(&self, now: DateTime<Utc>) -> u8 {
        if self.duration.is_zero() {
            return 100;
        }
        let ratio = self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64();
        (ratio * 100.0).round().min(100.0) as u8
    }

    pub fn remaining_text(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining(now);
        if remaining.is_zero() {
            return "Finalizando...".to_string();
        }
        let minutes = remaining.as_millis().div_ceil(60_000);
        format!("{} min restantes", minutes)
    }
}

/// Cosmetic analysis steps shown while the processing window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStage {
    Personal,
    Banking,
    Biometric,
}

impl DocumentStage {
    pub const ORDER: [DocumentStage; 3] = [Self::Personal, Self::Banking, Self::Biometric];

    pub fn duration(&self, config: &DocumentStageConfig) -> Duration {
        Duration::from_millis(match self {
            Self::Personal => config.personal_ms,
            Self::Banking => config.banking_ms,
            Self::Biometric => config.biometric_ms,
        })
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Personal => "Verificando datos personales",
            Self::Banking => "Validando información bancaria",
            Self::Biometric => "Análisis biométrico",
        }
    }

    /// Stage active at `elapsed`, with the time left until the next one.
    /// `None` once every stage has run.
    pub fn at(elapsed: Duration, config: &DocumentStageConfig) -> Option<(DocumentStage, Duration)> {
        let mut boundary = Duration::ZERO;
        for stage in Self::ORDER {
            boundary += stage.duration(config);
            if elapsed < boundary {
                return Some((stage, boundary - elapsed));
            }
        }
        None
    }
}

/// What the external renderer needs to draw the onboarding widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    pub stage: EvolutionStage,
    pub title: String,
    pub message: String,
    pub progress_percent: Option<u8>,
    pub remaining: Option<String>,
    pub document_stage: Option<DocumentStage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn window() -> (ProcessingWindow, DateTime<Utc>) {
        let start = Utc::now();
        (ProcessingWindow::new(start, Duration::from_secs(600)), start)
    }

    #[test]
    fn test_progress_and_remaining() {
        let (w, start) = window();
        assert_eq!(w.progress_percent(start), 0);
        let half = start + ChronoDuration::seconds(300);
        assert_eq!(w.progress_percent(half), 50);
        assert_eq!(w.remaining_text(half), "5 min restantes");
        let almost = start + ChronoDuration::seconds(541);
        assert_eq!(w.remaining_text(almost), "1 min restantes");
        assert!(w.is_active(almost));
    }

    #[test]
    fn test_expiry_caps_progress() {
        let (w, start) = window();
        let late = start + ChronoDuration::seconds(6000);
        assert!(w.is_expired(late));
        assert_eq!(w.progress_percent(late), 100);
        assert_eq!(w.remaining_text(late), "Finalizando...");
    }

    #[test]
    fn test_clock_going_backwards_counts_as_not_started() {
        let (w, start) = window();
        assert_eq!(w.elapsed(start - ChronoDuration::seconds(5)), Duration::ZERO);
    }

    #[test]
    fn test_document_stage_boundaries() {
        let config = DocumentStageConfig::default();
        let (stage, left) = DocumentStage::at(Duration::ZERO, &config).unwrap();
        assert_eq!(stage, DocumentStage::Personal);
        assert_eq!(left, Duration::from_secs(180));
        let (stage, _) = DocumentStage::at(Duration::from_secs(180), &config).unwrap();
        assert_eq!(stage, DocumentStage::Banking);
        let (stage, left) = DocumentStage::at(Duration::from_secs(500), &config).unwrap();
        assert_eq!(stage, DocumentStage::Biometric);
        assert_eq!(left, Duration::from_secs(100));
        assert!(DocumentStage::at(Duration::from_secs(600), &config).is_none());
    }
}
