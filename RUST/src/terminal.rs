use crate::input::ByteSource;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub const CURSOR_HOME: &str = "\x1b[H";
pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
pub const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";

/// How long the bytes of one escape sequence may trail its ESC.
const ESCAPE_FOLLOW_UP: Duration = Duration::from_millis(10);

/// Raw mode plus the alternate screen, undone on drop.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Self::activate(&mut io::stdout())
    }

    /// Raw mode is already on here, so a failed write restores before returning.
    fn activate(out: &mut impl Write) -> io::Result<Self> {
        let mut guard = Self { active: true };
        if let Err(e) = write_codes(out, &[ENTER_ALT_SCREEN, HIDE_CURSOR]) {
            if let Err(restore) = guard.restore_on(out) {
                tracing::warn!(error = %restore, "failed to restore terminal");
            }
            return Err(e);
        }
        Ok(guard)
    }

    pub fn restore(&mut self) -> io::Result<()> {
        self.restore_on(&mut io::stdout())
    }

    fn restore_on(&mut self, out: &mut impl Write) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        // Raw mode goes off even when the screen codes cannot be written.
        let written = write_codes(out, &[SHOW_CURSOR, LEAVE_ALT_SCREEN]);
        disable_raw_mode()?;
        written
    }
}

fn write_codes(out: &mut impl Write, codes: &[&str]) -> io::Result<()> {
    for code in codes {
        out.write_all(code.as_bytes())?;
    }
    out.flush()
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}

pub fn size() -> io::Result<(u16, u16)> {
    crossterm::terminal::size()
}

/// Stdin bytes, forwarded by a reader thread so follow-up bytes can be awaited with a timeout.
///
/// The reader thread only moves bytes; all tree state stays on the caller's thread.
pub struct StdinSource {
    rx: Receiver<u8>,
}

impl StdinSource {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let mut stdin = io::stdin().lock();
                let mut chunk = [0u8; 64];
                loop {
                    match stdin.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => {
                            if chunk[..n].iter().any(|b| tx.send(*b).is_err()) {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "stdin read failed");
                            break;
                        }
                    }
                }
            })?;
        Ok(Self { rx })
    }
}

impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        // A closed channel means stdin hit EOF.
        Ok(self.rx.recv().ok())
    }

    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.rx.recv_timeout(ESCAPE_FOLLOW_UP) {
            Ok(b) => Ok(Some(b)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}
