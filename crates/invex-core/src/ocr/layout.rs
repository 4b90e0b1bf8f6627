//! Reading-order layout of recognized text boxes.

use tracing::trace;

use super::TextBox;
use crate::models::config::OcrConfig;

struct Row<'a> {
    top: f32,
    bottom: f32,
    boxes: Vec<(f32, &'a str)>,
}

/// Join text boxes into lines and paragraphs.
///
/// Boxes whose tops lie within `row_tolerance` form one line, ordered left
/// to right. A blank line is emitted where the gap between two lines is
/// larger than `paragraph_gap_ratio` times the median line height.
pub fn layout_text(boxes: &[TextBox], config: &OcrConfig) -> String {
    let mut sorted: Vec<(f32, f32, f32, &str)> = boxes
        .iter()
        .filter(|b| !b.text.trim().is_empty())
        .map(|b| {
            let (x0, y0, _, y1) = b.rect();
            (y0, y1, x0, b.text.trim())
        })
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.2.total_cmp(&b.2)));

    let mut rows: Vec<Row<'_>> = Vec::new();
    for (top, bottom, x, text) in sorted {
        match rows.last_mut() {
            Some(row) if top - row.top <= config.row_tolerance => {
                row.bottom = row.bottom.max(bottom);
                row.boxes.push((x, text));
            }
            _ => rows.push(Row {
                top,
                bottom,
                boxes: vec![(x, text)],
            }),
        }
    }

    let mut heights: Vec<f32> = rows.iter().map(|r| r.bottom - r.top).collect();
    heights.sort_by(f32::total_cmp);
    let median = heights.get(heights.len() / 2).copied().unwrap_or(0.0);
    let gap_limit = median * config.paragraph_gap_ratio;

    let mut out = String::new();
    let mut prev_bottom: Option<f32> = None;
    for row in &mut rows {
        row.boxes.sort_by(|a, b| a.0.total_cmp(&b.0));
        let line = row
            .boxes
            .iter()
            .map(|(_, text)| *text)
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(bottom) = prev_bottom {
            out.push('\n');
            if row.top - bottom > gap_limit {
                out.push('\n');
            }
        }
        out.push_str(&line);
        prev_bottom = Some(row.bottom);
    }

    trace!("Laid out {} boxes into {} lines", boxes.len(), rows.len());
    out
}
