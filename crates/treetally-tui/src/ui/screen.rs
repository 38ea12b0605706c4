use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Text;

use crate::theme;
use crate::ui::text::{key_hint_height, key_hint_paragraph, wrapped_paragraph};

/// Full-screen header, body and key footer. Returns the body area for the caller to fill.
pub(crate) fn render_screen_frame(
    frame: &mut Frame<'_>,
    title: &str,
    header: Text<'_>,
    key_text: &str,
) -> Rect {
    let area = frame.area();
    let header_height = u16::try_from(header.lines.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    let footer_height = key_hint_height(area.width, key_text);
    let [header_area, body, footer] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(6),
            Constraint::Length(footer_height),
        ])
        .areas(area);

    frame.render_widget(
        wrapped_paragraph(header).block(theme::chrome(title.to_string())),
        header_area,
    );
    frame.render_widget(
        key_hint_paragraph(key_text.to_string()).block(theme::key_block()),
        footer,
    );
    body
}
