use crate::animation::{Channel, Ease, Timing};
use crate::core::ScaleSet;
use crate::render::ops::AnnotationSpec;
use crate::render::{AnnotationPrimitive, Color, LinePrimitive, TextHAlign, TextPrimitive};

const CHAR_WIDTH_EM: f64 = 0.6;
const LINE_HEIGHT_EM: f64 = 1.2;
const ANNOTATION_COLOR: Color = Color::rgb(0.2, 0.2, 0.2);

/// Layout constants of the callout overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub font_size: f64,
    /// Gap between the subject circle and the connector start.
    pub radius_padding: f64,
    pub wrap_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Callout {
    cx: f64,
    cy: f64,
    radius: f64,
    connector: LinePrimitive,
    title: Vec<TextPrimitive>,
}

/// Stateless overlay: every `render` tears the previous callouts down and
/// fades the new set in.
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    style: AnnotationStyle,
    callouts: Vec<Callout>,
    opacity: Channel<f64>,
}

impl AnnotationLayer {
    #[must_use]
    pub fn new(style: AnnotationStyle) -> Self {
        Self {
            style,
            callouts: Vec::new(),
            opacity: Channel::new(0.0),
        }
    }

    pub fn set_style(&mut self, style: AnnotationStyle) {
        self.style = style;
    }

    pub fn render(
        &mut self,
        now_ms: f64,
        specs: &[AnnotationSpec],
        scales: &ScaleSet,
        timing: Timing,
        ease: Ease,
        serial: u64,
    ) {
        let style = self.style;
        self.callouts = specs
            .iter()
            .map(|spec| build_callout(spec, scales, style))
            .collect();
        self.opacity.snap(0.0);
        self.opacity.animate(now_ms, 1.0, timing, ease, serial);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callouts.is_empty()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.opacity.is_animating()
    }

    pub fn settle(&mut self, now_ms: f64) {
        self.opacity.settle(now_ms);
    }

    #[must_use]
    pub fn sample(&self, now_ms: f64) -> Vec<AnnotationPrimitive> {
        let opacity = self.opacity.sample(now_ms).clamp(0.0, 1.0);
        self.callouts
            .iter()
            .map(|callout| AnnotationPrimitive {
                cx: callout.cx,
                cy: callout.cy,
                radius: callout.radius,
                connector: callout.connector,
                title: callout.title.clone(),
                opacity,
            })
            .collect()
    }
}

fn build_callout(spec: &AnnotationSpec, scales: &ScaleSet, style: AnnotationStyle) -> Callout {
    let (cx, cy) = scales.project_raw(spec.date, spec.value);
    let note_x = cx + spec.dx;
    let note_y = cy + spec.dy;

    // The connector leaves the subject circle towards the note.
    let distance = spec.dx.hypot(spec.dy);
    let start_offset = spec.radius + style.radius_padding;
    let (start_x, start_y) = if distance > start_offset {
        (
            cx + spec.dx / distance * start_offset,
            cy + spec.dy / distance * start_offset,
        )
    } else {
        (note_x, note_y)
    };
    let connector = LinePrimitive::new(start_x, start_y, note_x, note_y, 1.0, ANNOTATION_COLOR);

    let lines = wrap_text(spec.title.trim(), style.wrap_width, style.font_size);
    let line_height = style.font_size * LINE_HEIGHT_EM;
    let h_align = if spec.dx < 0.0 {
        TextHAlign::Right
    } else {
        TextHAlign::Left
    };
    let first_baseline = if spec.dy < 0.0 {
        note_y - spec.padding - line_height * lines.len().saturating_sub(1) as f64
    } else {
        note_y + spec.padding + style.font_size
    };
    let title = lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            TextPrimitive::new(
                line,
                note_x,
                first_baseline + line_height * index as f64,
                style.font_size,
                ANNOTATION_COLOR,
                h_align,
            )
        })
        .collect();

    Callout {
        cx,
        cy,
        radius: spec.radius,
        connector,
        title,
    }
}

/// Greedy word wrap against an estimated glyph width.
#[must_use]
pub fn wrap_text(text: &str, width_px: f64, font_size: f64) -> Vec<String> {
    let max_chars = ((width_px / (font_size * CHAR_WIDTH_EM)).floor() as usize).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::wrap_text;

    #[test]
    fn wraps_titles_at_the_configured_width() {
        let lines = wrap_text("Donald Trump (inauguration)", 120.0, 12.0);
        assert_eq!(lines, vec!["Donald Trump", "(inauguration)"]);
    }

    #[test]
    fn long_words_stay_on_their_own_line() {
        let lines = wrap_text("supercalifragilistic", 30.0, 12.0);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }
}
