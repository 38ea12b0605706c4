use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Clear;

use crate::centered_rect;
use crate::theme;
use crate::ui::text::{key_hint_height, key_hint_paragraph, wrapped_paragraph};

pub(crate) struct ModalSpec<'a> {
    pub(crate) title: &'a str,
    pub(crate) title_style: Option<Style>,
    pub(crate) body: Text<'a>,
    pub(crate) key_hint: Option<&'a str>,
    pub(crate) width_pct: u16,
    pub(crate) height_pct: u16,
}

pub(crate) struct ModalRenderResult {
    pub(crate) body_area: Rect,
}

/// Draws a centered box over whatever is on screen. The key hint goes below
/// the box when it fits, above it otherwise, and inside it as a last resort.
pub(crate) fn render_modal(frame: &mut Frame<'_>, spec: ModalSpec<'_>) -> ModalRenderResult {
    let area = centered_rect(spec.width_pct, spec.height_pct, frame.area());
    let title = match spec.title_style {
        Some(style) => Line::from(Span::styled(spec.title.to_string(), style)),
        None => Line::from(spec.title.to_string()),
    };

    let mut body_area = area;
    let key_area = spec.key_hint.map(|key_hint| {
        let footer_height = key_hint_height(area.width, key_hint);
        choose_key_area(frame.area(), area, footer_height).unwrap_or_else(|| {
            let [inner_body, inner_key] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
                .areas(area);
            body_area = inner_body;
            inner_key
        })
    });

    frame.render_widget(Clear, body_area);
    frame.render_widget(
        wrapped_paragraph(spec.body).block(theme::chrome(title)),
        body_area,
    );

    if let (Some(key_hint), Some(key_area)) = (spec.key_hint, key_area) {
        frame.render_widget(Clear, key_area);
        frame.render_widget(
            key_hint_paragraph(key_hint).block(theme::key_block()),
            key_area,
        );
    }

    ModalRenderResult { body_area }
}

fn choose_key_area(screen: Rect, body: Rect, footer_height: u16) -> Option<Rect> {
    let screen_bottom = screen.y.saturating_add(screen.height);
    let below_y = body.y.saturating_add(body.height);
    if below_y.saturating_add(footer_height) <= screen_bottom {
        return Some(Rect::new(body.x, below_y, body.width, footer_height));
    }

    let above_y = body.y.saturating_sub(footer_height);
    (above_y >= screen.y).then(|| Rect::new(body.x, above_y, body.width, footer_height))
}

pub(crate) fn render_error_modal(frame: &mut Frame<'_>, message: &str, footer: &str) {
    render_modal(
        frame,
        ModalSpec {
            title: "Error",
            title_style: Some(theme::error_prompt()),
            body: text_from_message(message),
            key_hint: Some(footer),
            width_pct: 80,
            height_pct: 50,
        },
    );
}

pub(crate) fn render_success_modal(frame: &mut Frame<'_>, message: &str, footer: &str) {
    render_modal(
        frame,
        ModalSpec {
            title: "Saved",
            title_style: Some(theme::success_prompt()),
            body: text_from_message(message),
            key_hint: Some(footer),
            width_pct: 70,
            height_pct: 40,
        },
    );
}

fn text_from_message(message: &str) -> Text<'static> {
    let base = message.trim_end();
    if base.is_empty() {
        return Text::from(vec![Line::from("")]);
    }
    Text::from(
        base.lines()
            .map(|line| Line::from(line.to_string()))
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;

    use super::{choose_key_area, text_from_message};

    #[test]
    fn text_from_message_keeps_each_line() {
        let text = text_from_message("Stem 3: height is required.\nFix it and retry.");
        assert_eq!(text.lines.len(), 2);
        assert_eq!(
            text.lines[0].spans[0].content.as_ref(),
            "Stem 3: height is required."
        );
    }

    #[test]
    fn text_from_message_handles_empty_message() {
        let text = text_from_message("   ");
        assert_eq!(text.lines.len(), 1);
        assert!(text.lines[0].spans.is_empty());
    }

    #[test]
    fn key_area_prefers_below_then_above() {
        let screen = Rect::new(0, 0, 80, 30);
        let body = Rect::new(10, 5, 60, 10);
        assert_eq!(
            choose_key_area(screen, body, 3),
            Some(Rect::new(10, 15, 60, 3))
        );

        let screen = Rect::new(10, 20, 80, 20);
        let body = Rect::new(15, 28, 60, 12);
        assert_eq!(
            choose_key_area(screen, body, 4),
            Some(Rect::new(15, 24, 60, 4))
        );
    }

    #[test]
    fn key_area_is_none_without_room_outside_modal() {
        let screen = Rect::new(10, 20, 80, 10);
        let body = Rect::new(15, 22, 60, 8);
        assert_eq!(choose_key_area(screen, body, 3), None);
    }
}
