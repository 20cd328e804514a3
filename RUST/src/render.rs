use crate::node::FlatRow;
use crate::record::display_value;
use crate::scrollbar::{thumb, Thumb};
use crate::state::{Pane, TreeState};
use crate::terminal::CURSOR_HOME;
use once_cell::sync::Lazy;
use regex::Regex;
use crossterm::style::{Attribute, Color as TermColor, SetAttribute, SetBackgroundColor, SetForegroundColor};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Widget};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const APP_NAME: &str = "reltree";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const TREE_WIDTH_RATIO: f64 = 0.4;
pub const MIN_TREE_WIDTH: u16 = 25;
/// Header, subheader, pane top border, pane bottom border, footer.
pub const CHROME_ROWS: u16 = 5;

static SGR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("regex"));

const FIELD_COLUMN: usize = 15;
const THUMB_GLYPH: &str = "█";
const TRACK_GLYPH: &str = "░";
const HELP: &str =
    " ↑↓ navigate  Space expand/collapse  Enter select  r make selected root  Tab switch pane  q quit ";

/// Pane geometry for one terminal size.
///
/// `tree_width` counts the tree pane plus its right separator, matching the classic
/// "40% but at least 25 columns" split; the tree text itself is `tree_width - 1` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    pub tree_width: u16,
    pub detail_width: u16,
    pub content_height: u16,
}

impl Layout {
    pub fn compute(width: u16, height: u16) -> Self {
        let inner = width.saturating_sub(2);
        let tree_width = ((f64::from(width) * TREE_WIDTH_RATIO) as u16)
            .max(MIN_TREE_WIDTH)
            .min(inner);
        Self {
            width,
            height,
            tree_width,
            detail_width: inner.saturating_sub(tree_width),
            content_height: height.saturating_sub(CHROME_ROWS),
        }
    }

    pub fn tree_text_width(&self) -> u16 {
        self.tree_width.saturating_sub(1)
    }

    fn fits(&self) -> bool {
        self.content_height > 0 && self.tree_text_width() > 0 && self.detail_width > 0
    }
}

/// Draws full frames of a [`TreeState`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    subtitle: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Second header line; defaults to the record store's source name.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// One complete frame: cursor home, then every row of the screen.
    ///
    /// Writes the pane heights of this terminal size back into `state`.
    pub fn render(&self, state: &mut TreeState, width: u16, height: u16) -> String {
        encode(&self.draw(state, width, height))
    }

    pub fn draw(&self, state: &mut TreeState, width: u16, height: u16) -> Buffer {
        let layout = Layout::compute(width, height);
        let mut buf = Buffer::empty(Rect::new(0, 0, width, height));

        let pane_height = usize::from(layout.content_height);
        state.set_tree_height(pane_height);
        state.set_detail_height(pane_height);
        let rows = state.visible_rows();
        let pairs = state.detail_pairs();
        state.set_detail_content_height(pairs.len());

        self.draw_header(&mut buf, state);
        if !layout.fits() {
            return buf;
        }

        self.draw_borders(&mut buf, &layout, state);
        self.draw_tree_pane(&mut buf, &layout, state, &rows);
        self.draw_detail_pane(&mut buf, &layout, state, &pairs);
        self.draw_footer(&mut buf, &layout, state);
        buf
    }

    fn draw_header(&self, buf: &mut Buffer, state: &TreeState) {
        let area = buf.area;
        if area.height == 0 {
            return;
        }
        let title = format!("{APP_NAME} v{VERSION}");
        buf.set_stringn(
            0,
            0,
            title,
            usize::from(area.width),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        );

        if area.height > 1 {
            let subtitle = self
                .subtitle
                .clone()
                .unwrap_or_else(|| state.store().source_name());
            buf.set_stringn(
                0,
                1,
                sanitize(&subtitle),
                usize::from(area.width),
                Style::default().add_modifier(Modifier::DIM),
            );
        }
    }

    fn draw_borders(&self, buf: &mut Buffer, layout: &Layout, state: &TreeState) {
        let area = buf.area;
        let pane_rows = layout.content_height + 2;
        let tree_area = Rect::new(0, 2, layout.tree_width + 1, pane_rows).intersection(area);
        let detail_area = Rect::new(layout.tree_width, 2, layout.detail_width + 2, pane_rows).intersection(area);

        let focused = Style::default().fg(Color::Magenta);
        let (tree_style, detail_style) = match state.focus() {
            Pane::Tree => (focused, Style::default()),
            Pane::Detail => (Style::default(), focused),
        };

        Block::bordered().border_style(tree_style).render(tree_area, buf);

        let mut detail = Block::bordered().border_style(detail_style);
        if let Some(node) = state.selected_record() {
            let title = format!(" [{}] {} ", node.type_label(), node.label(state.config()));
            detail = detail.title(sanitize(&title));
        }
        detail.render(detail_area, buf);

        // Shared separator column.
        let bottom = 2 + pane_rows - 1;
        if let Some(cell) = buf.cell_mut((layout.tree_width, 2)) {
            cell.set_symbol("┬");
        }
        if let Some(cell) = buf.cell_mut((layout.tree_width, bottom)) {
            cell.set_symbol("┴");
        }
    }

    fn draw_tree_pane(&self, buf: &mut Buffer, layout: &Layout, state: &TreeState, rows: &[FlatRow]) {
        let height = usize::from(layout.content_height);
        let scroll = state.tree_scroll();
        let bar = thumb(scroll, rows.len(), height);
        let mut text_width = usize::from(layout.tree_text_width());
        if bar.is_some() {
            text_width = text_width.saturating_sub(1);
        }

        for (line, (idx, row)) in rows.iter().enumerate().skip(scroll).take(height).enumerate() {
            let y = 3 + line as u16;
            let text = pad(&truncate(&format_row(row), text_width), text_width);
            buf.set_stringn(1, y, text, text_width, tree_row_style(state, idx, row));
        }

        if let Some(bar) = bar {
            draw_scrollbar(buf, layout.tree_width - 1, height, bar, state.is_tree_focused());
        }
    }

    fn draw_detail_pane(&self, buf: &mut Buffer, layout: &Layout, state: &TreeState, pairs: &[(String, Value)]) {
        let height = usize::from(layout.content_height);
        let scroll = state.detail_scroll();
        let bar = thumb(scroll, pairs.len(), height);
        let mut width = usize::from(layout.detail_width);
        if bar.is_some() {
            width = width.saturating_sub(1);
        }
        let x = layout.tree_width + 1;

        for (line, (field, value)) in pairs.iter().skip(scroll).take(height).enumerate() {
            let y = 3 + line as u16;
            buf.set_line(x, y, &detail_line(field, value, width), width as u16);
        }

        if let Some(bar) = bar {
            draw_scrollbar(buf, x + layout.detail_width - 1, height, bar, state.is_detail_focused());
        }
    }

    fn draw_footer(&self, buf: &mut Buffer, layout: &Layout, state: &TreeState) {
        let y = layout.height - 1;
        let width = usize::from(layout.width);
        let (text, style) = match state.status() {
            Some(status) => (
                format!(" error: {} ", sanitize(status)),
                Style::default().fg(Color::Red).add_modifier(Modifier::REVERSED),
            ),
            None => (
                HELP.to_string(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::REVERSED),
            ),
        };
        buf.set_stringn(0, y, center(&truncate(&text, width), width), width, style);
    }
}

fn format_row(row: &FlatRow) -> String {
    let indent = "  ".repeat(row.depth);
    let icon = match (row.expandable, row.expanded) {
        (false, _) => "  ",
        (true, true) => "▼ ",
        (true, false) => "▶ ",
    };
    format!("{indent}{icon}{}", sanitize(&row.label))
}

// Emphasis is additive: every rule that applies contributes to the line's style.
fn tree_row_style(state: &TreeState, idx: usize, row: &FlatRow) -> Style {
    let mut style = Style::default();
    if idx == state.cursor() {
        style = style.add_modifier(Modifier::REVERSED);
    }
    if !row.is_record() {
        style = style.fg(Color::Cyan);
    }
    if row.record_key.as_ref() == Some(state.root_key()) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if row.is_record() && row.path.as_slice() == state.selected_path() {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

fn detail_line(field: &str, value: &Value, width: usize) -> Line<'static> {
    let name = Span::styled(
        pad(&truncate(&sanitize(field), FIELD_COLUMN), FIELD_COLUMN),
        Style::default().add_modifier(Modifier::BOLD),
    );
    let value = match value {
        Value::Bool(true) => Span::styled("✓", Style::default().fg(Color::Green)),
        Value::Bool(false) => Span::styled("✗", Style::default().fg(Color::Red)),
        other => Span::raw(truncate(
            &sanitize(&display_value(other)),
            width.saturating_sub(FIELD_COLUMN + 3),
        )),
    };
    Line::from(vec![Span::raw(" "), name, Span::raw(" "), value])
}

fn draw_scrollbar(buf: &mut Buffer, x: u16, height: usize, bar: Thumb, focused: bool) {
    let thumb_style = if focused {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };
    for row in 0..height {
        let (glyph, style) = if bar.contains(row) {
            (THUMB_GLYPH, thumb_style)
        } else {
            (TRACK_GLYPH, Style::default().fg(Color::DarkGray))
        };
        if let Some(cell) = buf.cell_mut((x, 3 + row as u16)) {
            cell.reset();
            cell.set_symbol(glyph).set_style(style);
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Cut to `max` display columns, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

fn center(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    let left = fill / 2;
    format!("{}{s}{}", " ".repeat(left), " ".repeat(fill - left))
}

// ===== Frame encoding =====

/// Serialize a buffer as one full-screen frame of text and SGR sequences.
pub fn encode(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::with_capacity(usize::from(area.width) * usize::from(area.height) * 2);
    out.push_str(CURSOR_HOME);

    let mut current: Option<(Color, Color, Modifier)> = None;
    for (y, row) in buf.content().chunks(usize::from(area.width.max(1))).enumerate() {
        if y > 0 {
            out.push_str("\r\n");
        }
        let mut skip = 0usize;
        for cell in row {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let style = (cell.fg, cell.bg, cell.modifier);
            if current != Some(style) {
                push_style(&mut out, style);
                current = Some(style);
            }
            let symbol = cell.symbol();
            out.push_str(symbol);
            skip = symbol.width().saturating_sub(1);
        }
    }
    out.push_str(&SetAttribute(Attribute::Reset).to_string());
    out
}

fn push_style(out: &mut String, (fg, bg, modifier): (Color, Color, Modifier)) {
    out.push_str(&SetAttribute(Attribute::Reset).to_string());
    if fg != Color::Reset {
        out.push_str(&SetForegroundColor(term_color(fg)).to_string());
    }
    if bg != Color::Reset {
        out.push_str(&SetBackgroundColor(term_color(bg)).to_string());
    }
    let attributes = [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ];
    for (flag, attribute) in attributes {
        if modifier.contains(flag) {
            out.push_str(&SetAttribute(attribute).to_string());
        }
    }
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}

/// Strip SGR sequences, leaving only the visible text of a frame.
pub fn strip_ansi(frame: &str) -> String {
    SGR_RE.replace_all(frame, "").into_owned()
}
