//! Audible alerts via an external player command

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use super::types::{Alert, AlertError};
use super::AlertSink;

/// Plays a sound file on every alert
#[derive(Debug, Clone)]
pub struct SoundSink {
    player: String,
    sound_file: PathBuf,
}

impl SoundSink {
    /// Fails when `sound_file` does not exist
    pub fn new(player: impl Into<String>, sound_file: PathBuf) -> Result<Self, AlertError> {
        if !sound_file.is_file() {
            return Err(AlertError::SoundFileMissing(sound_file));
        }
        Ok(Self {
            player: player.into(),
            sound_file,
        })
    }
}

#[async_trait]
impl AlertSink for SoundSink {
    fn name(&self) -> &str {
        "sound"
    }

    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        tracing::debug!(alert_id = %alert.id, file = %self.sound_file.display(), "Playing alert sound");

        // Dropped on dispatch timeout, so the child must not outlive it
        let status = Command::new(&self.player)
            .arg(&self.sound_file)
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(AlertError::PlayerFailed {
                player: self.player.clone(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayThresholds;
    use crate::movement::{InstrumentClass, MovementResult, TriggerReason};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn alert() -> Alert {
        let now = Utc::now();
        Alert {
            id: Uuid::new_v4(),
            instrument_id: "^GSPC".to_string(),
            name: None,
            class: InstrumentClass::Index,
            movement: MovementResult {
                base_price: dec!(5000),
                current_price: dec!(5060),
                absolute_change: dec!(60),
                percentage_change: dec!(1.2),
                window_start: now,
                window_end: now,
            },
            reason: TriggerReason::PercentageUp { threshold: dec!(1) },
            display: DisplayThresholds::default(),
            context: vec![],
            context_requested: false,
            raised_at: now,
        }
    }

    #[test]
    fn test_missing_sound_file() {
        let err = SoundSink::new("afplay", PathBuf::from("/nonexistent/alert.mp3")).unwrap_err();
        assert!(matches!(err, AlertError::SoundFileMissing(_)));
    }

    #[tokio::test]
    async fn test_player_success() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = SoundSink::new("true", file.path().to_path_buf()).unwrap();
        assert_eq!(sink.name(), "sound");
        assert!(sink.notify(&alert()).await.is_ok());
    }

    #[tokio::test]
    async fn test_player_failure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = SoundSink::new("false", file.path().to_path_buf()).unwrap();

        let err = sink.notify(&alert()).await.unwrap_err();
        assert!(err.to_string().contains("sound player false exited"));
    }

    #[tokio::test]
    async fn test_player_not_installed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = SoundSink::new("no-such-player-binary", file.path().to_path_buf()).unwrap();
        assert!(sink.notify(&alert()).await.is_err());
    }
}
