//! Field-scene HUD and modal overlays.

use quizfield_engine::{Canvas, Rgba, ScreenRect, TextStyle, TEXT_BLOCK_PADDING};

const OBJECTIVE_BAR_HEIGHT: i32 = 32;
const OBJECTIVE_BAR_BG: Rgba = Rgba::rgb(20, 20, 60);
const OBJECTIVE_BAR_FG: Rgba = Rgba::rgb(255, 255, 200);
const OVERLAY_SHADE: Rgba = Rgba([0, 0, 0, 150]);
const PANEL_FILL: Rgba = Rgba::rgb(30, 30, 40);
const PANEL_BORDER: Rgba = Rgba::rgb(200, 200, 200);
const INVENTORY_WIDTH: i32 = 480;
const INVENTORY_HEIGHT: i32 = 360;
const INVENTORY_ROW: i32 = 22;

/// Characters of `style` text that fit in a text block `width` pixels wide.
pub(crate) fn chars_per_line(width: i32, style: TextStyle) -> usize {
    let usable = width - TEXT_BLOCK_PADDING * 2;
    (usable / style.glyph_advance()).max(1) as usize
}

/// Greedy word wrap. Words longer than a line are split.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(index, _)| index);
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub(crate) fn draw_objective_bar(canvas: &mut dyn Canvas, text: &str) {
    let (width, _) = canvas.size();
    let width = width as i32;
    canvas.fill_rect(
        ScreenRect::new(0, 0, width, OBJECTIVE_BAR_HEIGHT),
        OBJECTIVE_BAR_BG,
    );
    canvas.fill_rect(
        ScreenRect::new(0, OBJECTIVE_BAR_HEIGHT - 1, width, 1),
        Rgba::WHITE,
    );
    let style = TextStyle::new(OBJECTIVE_BAR_FG);
    let y = (OBJECTIVE_BAR_HEIGHT - style.line_advance()) / 2 + style.scale;
    canvas.draw_text(text, 15, y, style);
}

pub(crate) fn items_line(items: &[String]) -> String {
    if items.is_empty() {
        "ITEMS: -".to_string()
    } else {
        format!("ITEMS: {}", items.join(", "))
    }
}

pub(crate) fn draw_items_line(canvas: &mut dyn Canvas, items: &[String]) {
    canvas.draw_text(
        &items_line(items),
        8,
        OBJECTIVE_BAR_HEIGHT + 8,
        TextStyle::new(Rgba::WHITE).with_scale(2),
    );
}

fn centered_panel(canvas: &mut dyn Canvas, width: i32, height: i32) -> ScreenRect {
    let (screen_width, screen_height) = canvas.size();
    let (screen_width, screen_height) = (screen_width as i32, screen_height as i32);
    canvas.fill_rect(
        ScreenRect::new(0, 0, screen_width, screen_height),
        OVERLAY_SHADE,
    );
    let panel = ScreenRect::new(
        (screen_width - width) / 2,
        (screen_height - height) / 2,
        width,
        height,
    );
    canvas.fill_rect(panel, PANEL_FILL);
    canvas.stroke_rect(panel, PANEL_BORDER);
    canvas.stroke_rect(panel.inset(1), PANEL_BORDER);
    panel
}

pub(crate) fn draw_inventory_overlay(canvas: &mut dyn Canvas, items: &[String]) {
    let panel = centered_panel(canvas, INVENTORY_WIDTH, INVENTORY_HEIGHT);
    let title = TextStyle::new(Rgba::WHITE).with_scale(2);
    canvas.draw_text("INVENTORY (I TO CLOSE)", panel.x + 12, panel.y + 8, title);

    let style = TextStyle::new(Rgba::WHITE).with_scale(2);
    if items.is_empty() {
        canvas.draw_text("(EMPTY)", panel.x + 16, panel.y + 48, style);
        return;
    }
    for (row, item) in items.iter().enumerate() {
        let y = panel.y + 48 + row as i32 * INVENTORY_ROW;
        if y + INVENTORY_ROW > panel.bottom() {
            break;
        }
        canvas.draw_text(&format!("- {item}"), panel.x + 16, y, style);
    }
}

/// Draws the map overlay frame and returns the area left for the map itself.
pub(crate) fn draw_map_overlay_frame(canvas: &mut dyn Canvas) -> ScreenRect {
    let (screen_width, screen_height) = canvas.size();
    let panel = centered_panel(
        canvas,
        screen_width as i32 * 8 / 10,
        screen_height as i32 * 8 / 10,
    );
    let title = TextStyle::new(Rgba::WHITE).with_scale(2);
    canvas.draw_text("MAP (M TO CLOSE)", panel.x + 12, panel.y + 8, title);
    ScreenRect::new(panel.x + 12, panel.y + 32, panel.width - 24, panel.height - 44)
}

/// Short status line above the dialogue area, e.g. after saving.
pub(crate) fn draw_toast(canvas: &mut dyn Canvas, text: &str) {
    let (screen_width, _) = canvas.size();
    let style = TextStyle::new(Rgba::WHITE).with_scale(2);
    let width = style.text_width(text) + 24;
    let rect = ScreenRect::new(screen_width as i32 - width - 12, OBJECTIVE_BAR_HEIGHT + 8, width, 30);
    canvas.fill_rect(rect, Rgba([0, 0, 0, 200]));
    canvas.draw_text(text, rect.x + 12, rect.y + 8, style);
}

#[cfg(test)]
mod tests {
    use quizfield_engine::FrameCanvas;

    use super::*;

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn wrap_splits_overlong_words_and_keeps_empty_lines() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 4), vec![""]);
    }

    #[test]
    fn items_line_lists_items_or_a_dash() {
        assert_eq!(items_line(&[]), "ITEMS: -");
        assert_eq!(
            items_line(&["key".to_string(), "map".to_string()]),
            "ITEMS: key, map"
        );
    }

    #[test]
    fn objective_bar_spans_the_top_with_a_separator() {
        let mut frame = vec![0_u8; 100 * 60 * 4];
        let mut canvas = FrameCanvas::new(&mut frame, 100, 60);
        draw_objective_bar(&mut canvas, "GO");
        assert_eq!(canvas.pixel(99, 2), Some(OBJECTIVE_BAR_BG));
        assert_eq!(canvas.pixel(50, OBJECTIVE_BAR_HEIGHT - 1), Some(Rgba::WHITE));
        assert_eq!(canvas.pixel(50, OBJECTIVE_BAR_HEIGHT + 5), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn chars_per_line_accounts_for_padding() {
        let style = TextStyle::new(Rgba::WHITE);
        assert_eq!(
            chars_per_line(720, style),
            ((720 - TEXT_BLOCK_PADDING * 2) / style.glyph_advance()) as usize
        );
        assert_eq!(chars_per_line(0, style), 1);
    }
}
