//! Terminal-world implementations of the engine's collaborators.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use cadence_core::{Cue, CuePlayer, KeepAwake};
use tracing::{debug, warn};

/// Plays cues through the terminal: a BEL character per cue, so any
/// terminal with an audible (or visual) bell marks the cadence. The bell
/// cue rings twice to stand out from tick/tock.
pub struct TerminalCuePlayer {
    audible: bool,
}

impl TerminalCuePlayer {
    pub fn new(audible: bool) -> Self {
        Self { audible }
    }
}

impl CuePlayer for TerminalCuePlayer {
    fn play(&mut self, cue: Cue) -> std::io::Result<()> {
        if !self.audible {
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        match cue {
            Cue::Bell => out.write_all(b"\x07\x07")?,
            _ => out.write_all(b"\x07")?,
        }
        out.flush()
    }

    fn stop_all(&mut self) {
        // A terminal bell has no in-flight handle to cancel.
    }
}

/// Keep-awake that does nothing but log. Used unless `--keep-awake` is given.
pub struct NoopKeepAwake;

impl KeepAwake for NoopKeepAwake {
    fn acquire(&mut self) -> std::io::Result<()> {
        debug!("keep-awake requested (noop)");
        Ok(())
    }

    fn release(&mut self) {
        debug!("keep-awake released (noop)");
    }
}

/// Holds a `systemd-inhibit` child process while the timer runs, blocking
/// idle and sleep. The child is killed on release and on drop, so the
/// inhibitor can never outlive the process.
pub struct InhibitKeepAwake {
    child: Option<Child>,
}

impl InhibitKeepAwake {
    pub fn new() -> Self {
        Self { child: None }
    }
}

impl KeepAwake for InhibitKeepAwake {
    fn acquire(&mut self) -> std::io::Result<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let child = Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=cadence",
                "--why=interval timer running",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(pid = child.id(), "keep-awake inhibitor started");
        self.child = Some(child);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(error = %e, "failed to kill keep-awake inhibitor");
            }
            let _ = child.wait();
            debug!("keep-awake inhibitor stopped");
        }
    }
}

impl Drop for InhibitKeepAwake {
    fn drop(&mut self) {
        self.release();
    }
}
