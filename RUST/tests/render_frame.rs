mod common;

use common::*;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use reltree::*;

fn expanded_orders(order_count: usize) -> TreeState {
    let mut state = shop_state(order_count);
    move_to(&mut state, "orders (has_many)");
    state.toggle_expand().unwrap();
    state.move_to_top();
    state
}

#[test]
fn frame_is_homed_and_covers_every_row() {
    let mut state = expanded_orders(30);
    let frame = Renderer::new().render(&mut state, 100, 20);

    assert!(frame.starts_with("\x1b[H"));
    assert_eq!(frame.split("\r\n").count(), 20);

    let text = strip_ansi(&frame);
    assert!(text.contains(&format!("{APP_NAME} v{VERSION}")));
    assert!(text.contains("shop"));
    assert!(text.contains("▼ User #42"));
    assert!(text.contains("  ▼ orders (has_many) [25+]"));
    assert!(text.contains("▶ Order #1"));
    assert!(text.contains(" [User] User #42 "));
    assert!(text.contains("navigate"));
    assert!(text.contains("quit"));
}

#[test]
fn detail_pane_lists_fields_with_boolean_glyphs() {
    let mut state = shop_state(1);
    let text = strip_ansi(&Renderer::new().render(&mut state, 100, 20));

    assert!(text.contains(&format!(" {:<15} Ada", "name")));
    assert!(text.contains(&format!(" {:<15} ada@example.com", "email")));
    assert!(text.contains(&format!(" {:<15} ✗", "deleted")));
}

#[test]
fn renderer_reports_pane_heights_back() {
    let mut state = shop_state(1);
    Renderer::new().draw(&mut state, 100, 20);
    assert_eq!(state.tree_height(), 15);
    assert_eq!(state.detail_height(), 15);
    assert_eq!(state.detail_content_height(), 4);
}

#[test]
fn overflowing_tree_gets_a_scrollbar_in_its_last_column() {
    let mut state = expanded_orders(30);
    let buf = Renderer::new().draw(&mut state, 100, 20);
    let layout = Layout::compute(100, 20);
    let x = layout.tree_width - 1;

    // 30 rows in a 15 row pane: an 8 row thumb at the top.
    assert_eq!(buf.cell((x, 3)).unwrap().symbol(), "█");
    assert_eq!(buf.cell((x, 10)).unwrap().symbol(), "█");
    assert_eq!(buf.cell((x, 11)).unwrap().symbol(), "░");
    assert_eq!(buf.cell((x, 17)).unwrap().symbol(), "░");
}

#[test]
fn short_tree_has_no_scrollbar() {
    let mut state = shop_state(2);
    let buf = Renderer::new().draw(&mut state, 100, 20);
    let x = Layout::compute(100, 20).tree_width - 1;
    assert!((3..18).all(|y| buf.cell((x, y)).unwrap().symbol() == " "));
}

#[test]
fn overflowing_detail_gets_a_scrollbar() {
    let mut state = shop_state(1);
    let buf = Renderer::new().draw(&mut state, 100, 8);
    let layout = Layout::compute(100, 8);
    let x = layout.tree_width + layout.detail_width;
    assert_eq!(buf.cell((x, 3)).unwrap().symbol(), "█");
}

#[test]
fn cursor_root_and_selection_styles_combine() {
    let mut state = shop_state(1);
    let buf = Renderer::new().draw(&mut state, 100, 20);

    let root = buf.cell((1, 3)).unwrap();
    assert!(root.modifier.contains(Modifier::REVERSED));
    assert!(root.modifier.contains(Modifier::ITALIC));
    assert!(root.modifier.contains(Modifier::BOLD));

    let group = buf.cell((3, 4)).unwrap();
    assert_eq!(group.fg, Color::Cyan);
    assert!(!group.modifier.contains(Modifier::REVERSED));
}

#[test]
fn status_replaces_help_in_footer() {
    let mut state = shop_state(1);
    state.report_error(&ReltreeError::Store("timeout".to_string()));
    let text = strip_ansi(&Renderer::new().render(&mut state, 100, 20));
    assert!(text.contains(" error: store error: timeout "));
    assert!(!text.contains("navigate"));
}

#[test]
fn subtitle_can_be_overridden() {
    let mut state = shop_state(1);
    let text = strip_ansi(&Renderer::new().with_subtitle("fixtures/shop.json").render(&mut state, 100, 20));
    assert!(text.contains("fixtures/shop.json"));
}

#[test]
fn tiny_terminal_shows_only_the_header() {
    let mut state = shop_state(1);
    let text = strip_ansi(&Renderer::new().render(&mut state, 10, 3));
    assert!(text.starts_with("reltree v"));
    assert!(!text.contains("User #42"));

    let empty = Renderer::new().render(&mut state, 0, 0);
    assert!(empty.starts_with("\x1b[H"));
}

#[test]
fn long_labels_are_truncated_with_ellipsis() {
    let mut config = shop_config();
    config
        .model_mut("User")
        .configure_label(LabelFormat::Template("{name} {email} {email} {email}".to_string()));
    let mut state = open_user(std::sync::Arc::new(shop_store(0)), config, 42);
    let text = strip_ansi(&Renderer::new().render(&mut state, 60, 20));
    let row = text.split("\r\n").nth(3).unwrap();
    assert!(row.contains('…'));
}

#[test]
fn layout_splits_forty_percent_with_a_floor() {
    let wide = Layout::compute(100, 30);
    assert_eq!((wide.tree_width, wide.detail_width, wide.content_height), (40, 58, 25));

    let narrow = Layout::compute(50, 30);
    assert_eq!((narrow.tree_width, narrow.detail_width), (MIN_TREE_WIDTH, 23));
    assert_eq!(narrow.tree_text_width(), 24);
}

#[test]
fn encode_emits_styles_and_row_breaks() {
    let mut buf = Buffer::empty(Rect::new(0, 0, 3, 2));
    buf.set_string(0, 0, "ab", Style::default().fg(Color::Red));

    let out = encode(&buf);
    assert!(out.starts_with("\x1b[H"));
    assert!(out.contains("\x1b[38;5;1m"));
    assert!(out.ends_with("\x1b[0m"));
    assert_eq!(strip_ansi(&out), "ab \r\n   ");
}

#[test]
fn thumb_fills_track_proportionally() {
    assert_eq!(thumb(0, 10, 10), None);
    assert_eq!(thumb(0, 5, 0), None);
    assert_eq!(thumb(0, 20, 10), Some(Thumb { start: 0, size: 5 }));
    assert_eq!(thumb(10, 20, 10), Some(Thumb { start: 5, size: 5 }));
    assert_eq!(thumb(0, 1000, 10), Some(Thumb { start: 0, size: 1 }));
    // Offsets past the end are treated as the end.
    assert_eq!(thumb(50, 20, 10), Some(Thumb { start: 5, size: 5 }));
}

#[test]
fn thumb_leaves_the_ends_while_scrolling() {
    let (total, height) = (20, 10);
    for offset in 1..(total - height) {
        let t = thumb(offset, total, height).unwrap();
        assert!(t.start >= 1, "offset {offset}");
        assert!(t.start + t.size <= height - 1, "offset {offset}");
    }
}
