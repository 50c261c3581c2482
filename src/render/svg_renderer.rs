use serde::{Deserialize, Serialize};

use crate::error::NarrativeResult;
use crate::render::{
    AnnotationPrimitive, Color, LinePrimitive, PersonGroupPrimitive, RenderFrame, Renderer,
    TextHAlign, TextPrimitive,
};

/// Colors the SVG backend resolves group and marker classes to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvgPalette {
    pub line: Color,
    pub highlight: Color,
    pub marker_fill: Color,
    pub active: Color,
    pub label: Color,
    pub label_halo: Color,
    /// Opacity multiplier for filtered-out groups.
    pub faded_opacity: f64,
}

impl Default for SvgPalette {
    fn default() -> Self {
        Self {
            line: Color::rgb(0.6, 0.6, 0.6),
            highlight: Color::rgb(0.85, 0.29, 0.25),
            marker_fill: Color::rgb(1.0, 1.0, 1.0),
            active: Color::rgb(0.13, 0.13, 0.13),
            label: Color::rgb(0.13, 0.13, 0.13),
            label_halo: Color::rgb(1.0, 1.0, 1.0),
            faded_opacity: 0.1,
        }
    }
}

/// Serializes each frame into a standalone SVG document.
///
/// Groups keep their scene classes (`is-highlight`, `is-faded`, ...) so a
/// host stylesheet can override the inline palette.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    palette: SvgPalette,
    last_document: Option<String>,
}

impl SvgRenderer {
    #[must_use]
    pub fn new(palette: SvgPalette) -> Self {
        Self {
            palette,
            last_document: None,
        }
    }

    /// Document produced by the last successful `render`.
    #[must_use]
    pub fn last_document(&self) -> Option<&str> {
        self.last_document.as_deref()
    }

    #[must_use]
    pub fn into_document(self) -> Option<String> {
        self.last_document
    }

    fn document(&self, frame: &RenderFrame) -> String {
        let (width, height) = frame.surface_size();
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
            fmt(width),
            fmt(height),
            fmt(width),
            fmt(height)
        );

        out.push_str("<g class=\"g-axis\">");
        for line in &frame.axis_lines {
            push_line(&mut out, line);
        }
        for text in &frame.axis_texts {
            push_text(&mut out, text);
        }
        out.push_str("</g>");

        let translate = format!(
            "translate({}, {})",
            fmt(frame.margin.left),
            fmt(frame.margin.top)
        );
        out.push_str(&format!("<g class=\"g-vis\" transform=\"{translate}\">"));
        out.push_str("<g class=\"people\">");
        for group in &frame.people {
            self.push_group(&mut out, group);
        }
        out.push_str("</g>");
        if !frame.annotations.is_empty() {
            out.push_str("<g class=\"g-annotation\">");
            for annotation in &frame.annotations {
                push_annotation(&mut out, annotation);
            }
            out.push_str("</g>");
        }
        out.push_str("</g>");

        out.push_str(&format!(
            "<g class=\"g-voronoi\" transform=\"{translate}\">"
        ));
        for cell in &frame.voronoi {
            out.push_str(&format!(
                "<path data-id=\"{}\" d=\"{}\" fill=\"none\" pointer-events=\"all\"/>",
                escape(&cell.entity_id),
                cell.d
            ));
        }
        out.push_str("</g></svg>");
        out
    }

    fn push_group(&self, out: &mut String, group: &PersonGroupPrimitive) {
        let palette = &self.palette;
        let mut classes = vec!["person"];
        if group.is_highlight {
            classes.push("is-highlight");
        }
        if group.is_faded {
            classes.push("is-faded");
        }
        if group.is_active {
            classes.push("is-active");
        }
        let opacity = if group.is_faded {
            group.opacity * palette.faded_opacity
        } else {
            group.opacity
        };
        let stroke = if group.is_active {
            palette.active
        } else if group.is_highlight {
            palette.highlight
        } else {
            palette.line
        };

        out.push_str(&format!(
            "<g class=\"{}\" data-id=\"{}\" opacity=\"{}\">",
            classes.join(" "),
            escape(&group.entity_id),
            fmt(opacity)
        ));

        if let Some(path) = &group.path {
            let dash = path.dash.map_or_else(String::new, |dash| {
                format!(
                    " stroke-dasharray=\"{} {}\" stroke-dashoffset=\"{}\"",
                    fmt(dash.dash),
                    fmt(dash.gap),
                    fmt(dash.offset)
                )
            });
            out.push_str(&format!(
                "<path d=\"{}\" fill=\"none\" stroke=\"{}\" opacity=\"{}\"{dash}/>",
                path.d,
                stroke.to_css(),
                fmt(path.opacity)
            ));
        }

        out.push_str("<g class=\"circles\">");
        for circle in &group.circles {
            let mut circle_classes = Vec::new();
            if !circle.is_death_day {
                circle_classes.push("is-not-death-index");
            }
            if circle.is_transparent {
                circle_classes.push("is-transparent");
            }
            if circle.is_active {
                circle_classes.push("is-active");
            }
            let fill = if circle.is_transparent {
                "none".to_owned()
            } else {
                palette.marker_fill.to_css()
            };
            out.push_str(&format!(
                "<circle class=\"{}\" cx=\"0\" cy=\"0\" r=\"{}\" transform=\"translate({}, {})\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"{}\" opacity=\"{}\"/>",
                circle_classes.join(" "),
                fmt(circle.radius),
                fmt(circle.cx),
                fmt(circle.cy),
                stroke.to_css(),
                fmt(circle.stroke_width),
                fmt(circle.opacity)
            ));
        }
        out.push_str("</g>");

        let label = &group.label;
        let transform = format!("translate({}, {})", fmt(label.x), fmt(label.y));
        for (class, extra) in [
            (
                "bg",
                format!(
                    " stroke=\"{}\" stroke-width=\"3\"",
                    palette.label_halo.to_css()
                ),
            ),
            ("fg", String::new()),
        ] {
            out.push_str(&format!(
                "<text class=\"{class}\" text-anchor=\"middle\" alignment-baseline=\"baseline\" transform=\"{transform}\" fill=\"{}\" opacity=\"{}\"{extra}>{}</text>",
                palette.label.to_css(),
                fmt(label.opacity),
                escape(&label.text)
            ));
        }
        out.push_str("</g>");
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, frame: &RenderFrame) -> NarrativeResult<()> {
        frame.validate()?;
        self.last_document = Some(self.document(frame));
        Ok(())
    }
}

fn push_line(out: &mut String, line: &LinePrimitive) {
    out.push_str(&format!(
        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        fmt(line.x1),
        fmt(line.y1),
        fmt(line.x2),
        fmt(line.y2),
        line.color.to_css(),
        fmt(line.stroke_width)
    ));
}

fn push_text(out: &mut String, text: &TextPrimitive) {
    let anchor = match text.h_align {
        TextHAlign::Left => "start",
        TextHAlign::Center => "middle",
        TextHAlign::Right => "end",
    };
    out.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"{anchor}\" fill=\"{}\" opacity=\"{}\">{}</text>",
        fmt(text.x),
        fmt(text.y),
        fmt(text.font_size_px),
        text.color.to_css(),
        fmt(text.opacity),
        escape(&text.text)
    ));
}

fn push_annotation(out: &mut String, annotation: &AnnotationPrimitive) {
    out.push_str(&format!(
        "<g class=\"annotation\" opacity=\"{}\">",
        fmt(annotation.opacity)
    ));
    out.push_str(&format!(
        "<circle class=\"subject\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"{}\"/>",
        fmt(annotation.cx),
        fmt(annotation.cy),
        fmt(annotation.radius),
        annotation.connector.color.to_css()
    ));
    push_line(out, &annotation.connector);
    for line in &annotation.title {
        push_text(out, line);
    }
    out.push_str("</g>");
}

/// Compact number formatting: at most three decimals, no trailing zeros.
fn fmt(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
