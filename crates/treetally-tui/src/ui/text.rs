use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::theme;

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn key_hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

/// Footer height for a bordered key hint, growing when the hint wraps.
pub(crate) fn key_hint_height(total_width: u16, text: &str) -> u16 {
    let content_width = total_width.saturating_sub(2).max(1) as usize;
    let lines = wrapped_line_count(text, content_width);
    lines.saturating_add(2).max(3)
}

pub(crate) fn compact_hint<'a>(
    width: u16,
    full: &'a str,
    medium: &'a str,
    compact: &'a str,
) -> &'a str {
    if width >= 110 {
        full
    } else if width >= 78 {
        medium
    } else {
        compact
    }
}

pub(crate) fn focus_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::focus_prompt()))
}

pub(crate) fn label_value_line(
    label: impl Into<String>,
    value: impl Into<String>,
) -> Line<'static> {
    let label = label.into();
    let value = value.into();
    Line::from(vec![
        Span::styled(format!("{label}: "), theme::secondary_text()),
        Span::raw(value),
    ])
}

pub(crate) fn highlighted_label_value_line(
    label: impl Into<String>,
    value: impl Into<String>,
) -> Line<'static> {
    let label = label.into();
    let value = value.into();
    Line::from(vec![
        Span::styled(format!("{label}: "), theme::focus_prompt()),
        Span::styled(value, Style::default().add_modifier(Modifier::UNDERLINED)),
    ])
}

fn wrapped_line_count(text: &str, width: usize) -> u16 {
    if text.is_empty() {
        return 1;
    }

    text.split('\n')
        .map(|line| wrapped_line_count_single(line, width))
        .fold(0u16, u16::saturating_add)
        .max(1)
}

fn wrapped_line_count_single(line: &str, width: usize) -> u16 {
    let columns: usize = line
        .chars()
        .map(|ch| if ch == '\t' { 4 } else { 1 })
        .sum();
    if columns == 0 {
        return 1;
    }

    let lines = columns.div_ceil(width.max(1));
    u16::try_from(lines).unwrap_or(u16::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use ratatui::style::{Color, Modifier};

    use super::{
        compact_hint, focus_line, highlighted_label_value_line, key_hint_height, label_value_line,
        wrapped_line_count_single,
    };

    #[test]
    fn compact_hint_selects_variant_by_width() {
        assert_eq!(compact_hint(120, "full", "medium", "compact"), "full");
        assert_eq!(compact_hint(90, "full", "medium", "compact"), "medium");
        assert_eq!(compact_hint(60, "full", "medium", "compact"), "compact");
    }

    #[test]
    fn key_hint_height_tracks_wrapping() {
        assert_eq!(key_hint_height(80, "Enter: continue    Esc: back"), 3);
        assert!(key_hint_height(20, "Tab: next field    Enter: continue    Esc: back") > 3);
    }

    #[test]
    fn focus_line_uses_blue_bold_style() {
        let line = focus_line("Stem 1");
        assert_eq!(line.spans[0].content.as_ref(), "Stem 1");
        assert_eq!(line.spans[0].style.fg, Some(Color::Blue));
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn label_lines_format_with_colon() {
        let line = label_value_line("Tree ID", "T100");
        assert_eq!(line.spans[0].content.as_ref(), "Tree ID: ");
        assert_eq!(line.spans[1].content.as_ref(), "T100");

        let line = highlighted_label_value_line("Current selection", "Yes");
        assert_eq!(line.spans[0].style.fg, Some(Color::Blue));
        assert!(
            line.spans[1]
                .style
                .add_modifier
                .contains(Modifier::UNDERLINED)
        );
    }

    #[test]
    fn wrapped_line_count_counts_tabs_and_spaces() {
        assert_eq!(wrapped_line_count_single("a    b", 3), 2);
        assert_eq!(wrapped_line_count_single("a b", 3), 1);
        assert_eq!(wrapped_line_count_single("\t", 3), 2);
        assert_eq!(wrapped_line_count_single("", 3), 1);
    }
}
