use crate::error::Result;
use crate::input::{Action, ByteSource, InputHandler};
use crate::render::Renderer;
use crate::state::TreeState;
use std::io::{self, Write};

/// Apply one action. Vertical movement scrolls the detail pane while it has focus.
pub fn dispatch(state: &mut TreeState, action: Action) -> Result<()> {
    let detail = state.is_detail_focused();
    match action {
        Action::MoveUp if detail => state.scroll_detail_up(),
        Action::MoveDown if detail => state.scroll_detail_down(),
        Action::PageUp if detail => state.scroll_detail_by(-(state.detail_height().max(1) as isize)),
        Action::PageDown if detail => state.scroll_detail_by(state.detail_height().max(1) as isize),
        Action::Top if detail => state.scroll_detail_by(isize::MIN),
        Action::Bottom if detail => state.scroll_detail_by(isize::MAX),
        Action::MoveUp => state.move_up(),
        Action::MoveDown => state.move_down(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::Top => state.move_to_top(),
        Action::Bottom => state.move_to_bottom(),
        Action::ToggleExpand => state.toggle_expand()?,
        Action::Expand => state.expand_current()?,
        Action::Collapse => state.collapse_current()?,
        Action::Select => state.select_current(),
        Action::MakeRoot => state.make_selected_record_root(),
        Action::ToggleFocus => state.toggle_focus(),
        Action::Quit => {}
    }
    Ok(())
}

/// The render/input loop: draw a frame, block for the next key, apply it. Ends on `Quit`.
///
/// Store failures do not end the loop; they are shown in the footer until the next key.
pub fn run<S, W, F>(
    state: &mut TreeState,
    renderer: &Renderer,
    input: &mut InputHandler<S>,
    out: &mut W,
    mut size: F,
) -> Result<()>
where
    S: ByteSource,
    W: Write,
    F: FnMut() -> io::Result<(u16, u16)>,
{
    loop {
        let (width, height) = size()?;
        let frame = renderer.render(state, width, height);
        out.write_all(frame.as_bytes())?;
        out.flush()?;

        let Some(action) = input.read_action()? else {
            continue;
        };
        tracing::trace!(?action, "input");
        if action == Action::Quit {
            break;
        }

        state.clear_status();
        if let Err(e) = dispatch(state, action) {
            state.report_error(&e);
        }
    }
    Ok(())
}
