use tracing::debug;

/// Plays the audible warning raised for high and critical triage results.
///
/// Failures are reported to the caller, which logs and otherwise ignores
/// them; a missing speaker must never break a chat turn.
pub trait AlertPlayer: Send + Sync {
    fn play(&self) -> anyhow::Result<()>;
}

/// No-op player for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlert;

impl AlertPlayer for SilentAlert {
    fn play(&self) -> anyhow::Result<()> {
        debug!("Alert suppressed (silent player)");
        Ok(())
    }
}
