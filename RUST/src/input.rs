use std::io;

pub const ESC: u8 = 0x1b;
// Longest control sequence we bother collecting after ESC.
const MAX_SEQUENCE_LEN: usize = 8;

/// What the user asked for, independent of which key produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    ToggleExpand,
    Expand,
    Collapse,
    Select,
    MakeRoot,
    ToggleFocus,
    Top,
    Bottom,
    PageUp,
    PageDown,
    Quit,
}

/// Map one input unit (a byte, or a whole escape sequence) to an action.
pub fn action_for(unit: &[u8]) -> Option<Action> {
    let action = match unit {
        b"\x1b[A" | b"\x1bOA" | b"k" => Action::MoveUp,
        b"\x1b[B" | b"\x1bOB" | b"j" => Action::MoveDown,
        b"\x1b[C" | b"\x1bOC" | b"l" => Action::Expand,
        b"\x1b[D" | b"\x1bOD" | b"h" => Action::Collapse,
        b" " => Action::ToggleExpand,
        b"\r" | b"\n" => Action::Select,
        b"r" => Action::MakeRoot,
        b"\t" => Action::ToggleFocus,
        b"g" | b"\x1b[H" | b"\x1b[1~" => Action::Top,
        b"G" | b"\x1b[F" | b"\x1b[4~" => Action::Bottom,
        b"\x1b[5~" => Action::PageUp,
        b"\x1b[6~" => Action::PageDown,
        // Ctrl-C arrives as a plain byte in raw mode.
        b"q" | b"\x03" => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Raw terminal bytes.
pub trait ByteSource {
    /// Block until a byte arrives. `None` once input is closed.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// A byte only if one is available right away.
    fn try_read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Turns raw bytes into [`Action`]s.
pub struct InputHandler<S> {
    source: S,
}

impl<S: ByteSource> InputHandler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Next input unit. A lone ESC (nothing follows it right away) is returned as is.
    pub fn read_unit(&mut self) -> io::Result<Option<Vec<u8>>> {
        let Some(first) = self.source.read_byte()? else {
            return Ok(None);
        };
        if first != ESC {
            return Ok(Some(vec![first]));
        }

        let mut unit = vec![ESC];
        let Some(second) = self.source.try_read_byte()? else {
            return Ok(Some(unit));
        };
        unit.push(second);

        match second {
            // CSI: parameters, then one final byte in 0x40..=0x7E.
            b'[' => {
                while unit.len() < MAX_SEQUENCE_LEN {
                    let Some(b) = self.source.try_read_byte()? else { break };
                    unit.push(b);
                    if (0x40..=0x7e).contains(&b) {
                        break;
                    }
                }
            }
            // SS3: exactly one more byte.
            b'O' => {
                if let Some(b) = self.source.try_read_byte()? {
                    unit.push(b);
                }
            }
            _ => {}
        }
        Ok(Some(unit))
    }

    /// `Ok(None)` for input that maps to nothing. Closed input reads as [`Action::Quit`].
    pub fn read_action(&mut self) -> io::Result<Option<Action>> {
        match self.read_unit()? {
            Some(unit) => {
                let action = action_for(&unit);
                if action.is_none() {
                    tracing::trace!(unit = ?unit, "ignoring unmapped input");
                }
                Ok(action)
            }
            None => Ok(Some(Action::Quit)),
        }
    }
}
