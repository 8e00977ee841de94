//! One-line sparkline for per-post series

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Bar for `value` on a 0..=max scale
fn bar(value: u64, max: u64) -> char {
    let max = max.max(1);
    let scaled = ((value as f64 / max as f64) * 7.0).round() as usize;
    BARS[scaled.min(7)]
}

/// Most recent values that fit in `width`
fn tail(data: &[u64], width: usize) -> &[u64] {
    &data[data.len().saturating_sub(width)..]
}

pub struct MiniSparkline<'a> {
    data: &'a [u64],
    style: Style,
}

impl<'a> MiniSparkline<'a> {
    pub fn new(data: &'a [u64]) -> Self {
        Self {
            data,
            style: Style::default().fg(Color::Cyan),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl<'a> Widget for MiniSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let shown = tail(self.data, area.width as usize);
        let max = shown.iter().copied().max().unwrap_or(1);
        for (i, &value) in shown.iter().enumerate() {
            let x = area.x + i as u16;
            buf.get_mut(x, area.y)
                .set_char(bar(value, max))
                .set_style(self.style);
        }
    }
}

/// Sparkline as plain text (scaled over the shown tail)
pub fn sparkline_text(data: &[u64], width: usize) -> String {
    let shown = tail(data, width);
    let max = shown.iter().copied().max().unwrap_or(1);
    shown.iter().map(|&v| bar(v, max)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_text_scales_to_max() {
        assert_eq!(sparkline_text(&[0, 5, 10], 8), "▁▅█");
        assert_eq!(sparkline_text(&[0, 0], 8), "▁▁");
    }

    #[test]
    fn test_sparkline_text_keeps_most_recent() {
        let text = sparkline_text(&[100, 1, 2, 3], 3);
        assert_eq!(text.chars().count(), 3);
        assert!(text.ends_with('█'));
        assert!(sparkline_text(&[], 8).is_empty());
    }
}
