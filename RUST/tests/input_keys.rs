use reltree::*;
use std::collections::VecDeque;
use std::io;

/// Bytes grouped the way a terminal delivers them: a burst is available at once,
/// the next burst only after a pause.
struct Bursts(VecDeque<VecDeque<u8>>);

impl Bursts {
    fn new(bursts: &[&str]) -> Self {
        Self(bursts.iter().map(|b| b.bytes().collect()).collect())
    }
}

impl ByteSource for Bursts {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        while let Some(burst) = self.0.front_mut() {
            if let Some(b) = burst.pop_front() {
                return Ok(Some(b));
            }
            self.0.pop_front();
        }
        Ok(None)
    }

    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.0.front_mut().and_then(VecDeque::pop_front))
    }
}

fn actions(bursts: &[&str]) -> Vec<Option<Action>> {
    let mut input = InputHandler::new(Bursts::new(bursts));
    let mut out = vec![];
    loop {
        let action = input.read_action().unwrap();
        if action == Some(Action::Quit) {
            break;
        }
        out.push(action);
    }
    out
}

#[test]
fn arrow_keys_in_both_encodings() {
    assert_eq!(
        actions(&["\x1b[A", "\x1b[B", "\x1bOC", "\x1bOD"]),
        [Some(Action::MoveUp), Some(Action::MoveDown), Some(Action::Expand), Some(Action::Collapse)]
    );
}

#[test]
fn vim_keys_and_commands() {
    assert_eq!(
        actions(&["kj lh\rr\t"]),
        [
            Some(Action::MoveUp),
            Some(Action::MoveDown),
            Some(Action::ToggleExpand),
            Some(Action::Expand),
            Some(Action::Collapse),
            Some(Action::Select),
            Some(Action::MakeRoot),
            Some(Action::ToggleFocus),
        ]
    );
}

#[test]
fn paging_and_jumps() {
    assert_eq!(
        actions(&["\x1b[5~", "\x1b[6~", "g", "\x1b[F", "\x1b[1~"]),
        [
            Some(Action::PageUp),
            Some(Action::PageDown),
            Some(Action::Top),
            Some(Action::Bottom),
            Some(Action::Top),
        ]
    );
}

#[test]
fn sequences_split_from_following_keys() {
    // A full sequence followed by a plain key in the same burst.
    assert_eq!(actions(&["\x1b[Bj"]), [Some(Action::MoveDown), Some(Action::MoveDown)]);
}

#[test]
fn lone_escape_is_ignored() {
    assert_eq!(actions(&["\x1b", "j"]), [None, Some(Action::MoveDown)]);
}

#[test]
fn unmapped_input_is_ignored() {
    assert_eq!(actions(&["x", "\x1b[Z", "k"]), [None, None, Some(Action::MoveUp)]);
}

#[test]
fn quit_keys() {
    let mut input = InputHandler::new(Bursts::new(&["q"]));
    assert_eq!(input.read_action().unwrap(), Some(Action::Quit));

    let mut input = InputHandler::new(Bursts::new(&["\x03"]));
    assert_eq!(input.read_action().unwrap(), Some(Action::Quit));
}

#[test]
fn closed_input_quits() {
    let mut input = InputHandler::new(Bursts::new(&[]));
    assert_eq!(input.read_action().unwrap(), Some(Action::Quit));
}

#[test]
fn read_unit_keeps_whole_sequences() {
    let mut input = InputHandler::new(Bursts::new(&["\x1b[5~x"]));
    assert_eq!(input.read_unit().unwrap().as_deref(), Some(&b"\x1b[5~"[..]));
    assert_eq!(input.read_unit().unwrap().as_deref(), Some(&b"x"[..]));
    assert_eq!(input.read_unit().unwrap(), None);
}

#[test]
fn key_map_lookup() {
    assert_eq!(action_for(b"\x1b[A"), Some(Action::MoveUp));
    assert_eq!(action_for(b" "), Some(Action::ToggleExpand));
    assert_eq!(action_for(&[ESC]), None);
    assert_eq!(action_for(b""), None);
}
