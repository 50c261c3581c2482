use crate::animation::{Channel, Ease, Timing};
use crate::core::{AxisTick, Margin, ScaleSet, Viewport};
use crate::render::{Color, LinePrimitive, TextHAlign, TextPrimitive};

const GRID_COLOR: Color = Color::rgb(0.85, 0.85, 0.85);
const TICK_TEXT_COLOR: Color = Color::rgb(0.4, 0.4, 0.4);
/// Baseline shift of bottom-axis labels, in em.
const X_LABEL_DY_EM: f64 = 0.71;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisSide {
    Left,
    Bottom,
}

#[derive(Debug, Clone)]
struct TickNode {
    value: f64,
    label: String,
    position: Channel<f64>,
    opacity: Channel<f64>,
    exit_at: Option<f64>,
}

/// One axis with keyed, animated ticks.
///
/// Entering ticks start where the previous scale would have put them and
/// fade in; leaving ticks travel to their new position while fading out.
#[derive(Debug, Clone)]
struct AxisTrack {
    side: AxisSide,
    ticks: Vec<TickNode>,
}

impl AxisSide {
    fn project(self, scales: &ScaleSet, value: f64) -> f64 {
        match self {
            Self::Left => scales.y.apply(value),
            Self::Bottom => scales.x.apply_millis(value),
        }
    }
}

impl AxisTrack {
    fn new(side: AxisSide) -> Self {
        Self {
            side,
            ticks: Vec::new(),
        }
    }

    fn update(&mut self, update: TrackUpdate<'_>) {
        let TrackUpdate {
            now_ms,
            previous,
            scales,
            ticks,
            timing,
            ease,
            serial,
        } = update;
        let side = self.side;

        for node in &mut self.ticks {
            if ticks.iter().any(|tick| tick.value == node.value) {
                continue;
            }
            let target = side.project(scales, node.value);
            node.position.animate(now_ms, target, timing, ease, serial);
            node.opacity.animate(now_ms, 0.0, timing, ease, serial);
            node.exit_at = Some(now_ms + timing.duration_ms.max(0.0));
        }

        for tick in ticks {
            let target = side.project(scales, tick.value);
            match self.ticks.iter_mut().find(|node| node.value == tick.value) {
                Some(node) => {
                    node.label = tick.label.clone();
                    node.exit_at = None;
                    node.position.animate(now_ms, target, timing, ease, serial);
                    node.opacity.animate(now_ms, 1.0, timing, ease, serial);
                }
                None => {
                    let start = previous
                        .map(|previous| side.project(previous, tick.value))
                        .filter(|start| start.is_finite())
                        .unwrap_or(target);
                    let mut node = TickNode {
                        value: tick.value,
                        label: tick.label.clone(),
                        position: Channel::new(start),
                        opacity: Channel::new(0.0),
                        exit_at: None,
                    };
                    node.position.animate(now_ms, target, timing, ease, serial);
                    node.opacity.animate(now_ms, 1.0, timing, ease, serial);
                    self.ticks.push(node);
                }
            }
        }
    }

    fn is_animating(&self) -> bool {
        self.ticks.iter().any(|node| {
            node.exit_at.is_some() || node.position.is_animating() || node.opacity.is_animating()
        })
    }

    fn settle(&mut self, now_ms: f64) {
        self.ticks
            .retain(|node| node.exit_at.is_none_or(|exit_at| exit_at > now_ms));
        for node in &mut self.ticks {
            node.position.settle(now_ms);
            node.opacity.settle(now_ms);
        }
    }
}

struct TrackUpdate<'a> {
    now_ms: f64,
    previous: Option<&'a ScaleSet>,
    scales: &'a ScaleSet,
    ticks: &'a [AxisTick],
    timing: Timing,
    ease: Ease,
    serial: u64,
}

/// Surface geometry the axes are laid out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStyle {
    pub viewport: Viewport,
    pub margin: Margin,
    pub font_size: f64,
}

/// Left value axis with full-width grid lines and a bottom time axis.
#[derive(Debug, Clone)]
pub struct AxisLayer {
    style: AxisStyle,
    scales: Option<ScaleSet>,
    y: AxisTrack,
    x: AxisTrack,
}

impl AxisLayer {
    #[must_use]
    pub fn new(style: AxisStyle) -> Self {
        Self {
            style,
            scales: None,
            y: AxisTrack::new(AxisSide::Left),
            x: AxisTrack::new(AxisSide::Bottom),
        }
    }

    pub fn set_style(&mut self, style: AxisStyle) {
        self.style = style;
    }

    /// Retargets both axes onto `scales`; `ticks` is `(y, x)`.
    pub fn update(
        &mut self,
        now_ms: f64,
        scales: &ScaleSet,
        ticks: (&[AxisTick], &[AxisTick]),
        timing: Timing,
        ease: Ease,
        serial: u64,
    ) {
        let (y_ticks, x_ticks) = ticks;
        let previous = self.scales;
        self.y.update(TrackUpdate {
            now_ms,
            previous: previous.as_ref(),
            scales,
            ticks: y_ticks,
            timing,
            ease,
            serial,
        });
        self.x.update(TrackUpdate {
            now_ms,
            previous: previous.as_ref(),
            scales,
            ticks: x_ticks,
            timing,
            ease,
            serial,
        });
        self.scales = Some(*scales);
    }

    /// `true` while a tick is moving, fading or waiting to be removed.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.y.is_animating() || self.x.is_animating()
    }

    pub fn settle(&mut self, now_ms: f64) {
        self.y.settle(now_ms);
        self.x.settle(now_ms);
    }

    /// Grid lines and labels in surface coordinates.
    #[must_use]
    pub fn sample(&self, now_ms: f64) -> (Vec<LinePrimitive>, Vec<TextPrimitive>) {
        let AxisStyle {
            viewport,
            margin,
            font_size,
        } = self.style;
        let mut lines = Vec::with_capacity(self.y.ticks.len());
        let mut texts = Vec::with_capacity(self.y.ticks.len() + self.x.ticks.len());

        for node in &self.y.ticks {
            let y = margin.top + node.position.sample(now_ms);
            let opacity = node.opacity.sample(now_ms).clamp(0.0, 1.0);
            let mut color = GRID_COLOR;
            color.alpha = opacity;
            lines.push(LinePrimitive::new(
                0.0,
                y,
                viewport.width + margin.left,
                y,
                1.0,
                color,
            ));
            if !node.label.is_empty() {
                texts.push(
                    TextPrimitive::new(
                        node.label.clone(),
                        0.0,
                        y - font_size / 2.0,
                        font_size,
                        TICK_TEXT_COLOR,
                        TextHAlign::Left,
                    )
                    .with_opacity(opacity),
                );
            }
        }

        let baseline = viewport.height + margin.bottom - font_size + font_size * X_LABEL_DY_EM;
        for node in &self.x.ticks {
            if node.label.is_empty() {
                continue;
            }
            texts.push(
                TextPrimitive::new(
                    node.label.clone(),
                    margin.left + node.position.sample(now_ms),
                    baseline,
                    font_size,
                    TICK_TEXT_COLOR,
                    TextHAlign::Center,
                )
                .with_opacity(node.opacity.sample(now_ms).clamp(0.0, 1.0)),
            );
        }

        (lines, texts)
    }
}
