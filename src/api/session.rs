use std::collections::HashSet;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::api::loader::{EntityMetadata, RawPageviewRow, build_store};
use crate::api::{
    NarrativeConfig, NarrativeState, ScrollDirection, ScrollEvent, ScrollRegion, ScrollTracker,
    Step, StepContext, TooltipEvent, plan_step,
};
use crate::core::{Entity, Viewport, WindowSize};
use crate::error::NarrativeResult;
use crate::render::{RenderFrame, Renderer, Scene, SceneLayout};

/// Visual filter: groups whose `name` attribute does not include `value`
/// are faded. `Filter::default()` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Filter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    /// `true` when `entity`'s attribute includes the filter value. String
    /// attributes match on substrings, arrays on elements.
    #[must_use]
    pub fn includes(&self, entity: &Entity) -> bool {
        let (Some(name), Some(value)) = (&self.name, &self.value) else {
            return true;
        };
        match name.as_str() {
            "pageid" => return entity.id.contains(value.as_str()),
            "display" => return entity.display_name.contains(value.as_str()),
            _ => {}
        }
        match entity.attributes.get(name) {
            Some(Value::String(text)) => text.contains(value.as_str()),
            Some(Value::Array(items)) => items.iter().any(|item| match item {
                Value::String(text) => text == value,
                other => other.to_string() == *value,
            }),
            _ => false,
        }
    }
}

/// Scroll-driven narrative session.
///
/// Owns the dataset, the retained scene and the renderer backend. Hosts feed
/// it scroll offsets, pointer positions and clock deltas, then call
/// [`NarrativeSession::render`].
pub struct NarrativeSession<R: Renderer> {
    renderer: R,
    state: NarrativeState,
    scene: Scene,
    window: WindowSize,
    current_step: Option<Step>,
    hover_enabled: bool,
    steps: ScrollTracker,
    hover: ScrollTracker,
}

impl<R: Renderer> NarrativeSession<R> {
    /// Cleans the dataset and performs the first layout.
    pub fn init(
        renderer: R,
        config: NarrativeConfig,
        metadata: &[EntityMetadata],
        population_rows: &[RawPageviewRow],
        comparison_rows: &[RawPageviewRow],
        window: WindowSize,
    ) -> NarrativeResult<Self> {
        config.validate()?;
        let store = build_store(&config, metadata, population_rows, comparison_rows)?;
        let viewport = NarrativeState::viewport_for(&config, window)?;
        let state = NarrativeState::new(config, store, viewport)?;
        let layout = scene_layout(&state.config, viewport);
        let steps = ScrollTracker::new(state.config.step_offset);
        let hover = ScrollTracker::new(state.config.hover_offset);

        debug!(
            width = viewport.width,
            height = viewport.height,
            people = state.store.people().len(),
            "narrative session initialized"
        );
        let mut session = Self {
            renderer,
            state,
            scene: Scene::new(layout),
            window,
            current_step: None,
            hover_enabled: false,
            steps,
            hover,
        };
        session.resize(window)?;
        Ok(session)
    }

    #[must_use]
    pub fn state(&self) -> &NarrativeState {
        &self.state
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        self.current_step
    }

    #[must_use]
    pub fn hover_enabled(&self) -> bool {
        self.hover_enabled
    }

    pub fn set_hover_enabled(&mut self, enabled: bool) {
        self.hover_enabled = enabled;
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Recomputes the plot area and replays the current step without
    /// animation.
    pub fn resize(&mut self, window: WindowSize) -> NarrativeResult<()> {
        let viewport = NarrativeState::viewport_for(&self.state.config, window)?;
        self.window = window;
        self.state.viewport = viewport;
        self.scene.set_layout(scene_layout(&self.state.config, viewport));
        trace!(
            width = viewport.width,
            height = viewport.height,
            "session resized"
        );
        self.update_step(StepContext::leave())
    }

    pub fn set_step_regions(&mut self, regions: Vec<ScrollRegion>) {
        self.steps.set_regions(regions);
    }

    pub fn set_hover_region(&mut self, region: ScrollRegion) {
        self.hover.set_regions(vec![region]);
    }

    /// Feeds a new document scroll offset. Returns a tooltip instruction when
    /// leaving the hover region hides it.
    pub fn on_scroll(&mut self, scroll_y: f64) -> NarrativeResult<Option<TooltipEvent>> {
        let window_height = self.window.window_height;
        for event in self.steps.update(scroll_y, window_height) {
            if let ScrollEvent::Enter {
                name, direction, ..
            } = event
            {
                let reverse = direction == ScrollDirection::Up;
                self.enter_step(&name, reverse)?;
            }
        }

        let mut tooltip = None;
        for event in self.hover.update(scroll_y, window_height) {
            match event {
                ScrollEvent::Enter { .. } => {
                    debug!("hover enabled");
                    self.hover_enabled = true;
                }
                ScrollEvent::Exit { .. } => {
                    debug!("hover disabled");
                    self.hover_enabled = false;
                    tooltip = Some(TooltipEvent::Hide);
                }
            }
        }
        Ok(tooltip)
    }

    /// Makes `name` the current step and plays it. Unknown names leave the
    /// scene untouched.
    pub fn enter_step(&mut self, name: &str, reverse: bool) -> NarrativeResult<()> {
        let Ok(step) = name.parse::<Step>() else {
            debug!(step = name, "unknown step ignored");
            return Ok(());
        };
        debug!(step = step.name(), reverse, "step enter");
        self.current_step = Some(step);
        self.update_step(StepContext {
            reverse,
            leave: false,
        })
    }

    /// Moves `delta` steps through the step table, clamped to its ends.
    pub fn navigate(&mut self, delta: isize) -> NarrativeResult<Step> {
        let step = match self.current_step {
            Some(step) => step.offset(delta),
            None => Step::ALL[0].offset(delta),
        };
        self.current_step = Some(step);
        self.update_step(StepContext {
            reverse: delta < 0,
            leave: false,
        })?;
        Ok(step)
    }

    /// Replays the current step with `context`; a no-op before any step was
    /// entered.
    pub fn update_step(&mut self, context: StepContext) -> NarrativeResult<()> {
        let Some(step) = self.current_step else {
            return Ok(());
        };
        let plans = plan_step(&self.state, step, context)?;
        for plan in &plans {
            trace!(
                step = plan.step.name(),
                ops = plan.op_count(),
                "apply step plan"
            );
            self.scene.apply(&plan.scene);
            self.scene.advance_to(self.scene.now_ms());
        }
        Ok(())
    }

    /// Advances the animation clock.
    pub fn advance(&mut self, delta_ms: f64) {
        self.scene.advance(delta_ms);
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.scene.is_animating()
    }

    /// Hover dispatch for a surface-space pointer position. Only active
    /// during `compare` with hover enabled.
    ///
    /// The tooltip anchor is the death-day marker's transition target, not
    /// its sampled position, so right after a resize it already points at
    /// where the marker will settle.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<TooltipEvent> {
        if !self.hover_enabled || self.current_step != Some(Step::Compare) {
            return None;
        }
        let margin = self.state.config.margin;
        let entity_id = self
            .scene
            .hit_test(Point::new(x - margin.left, y - margin.top))?
            .to_owned();
        self.scene.set_active(Some(&entity_id));
        if !self.scene.contains(&entity_id) {
            return None;
        }
        self.scene.raise(&entity_id);
        let (anchor_x, anchor_y) = self.scene.death_day_anchor(&entity_id)?;
        let display_name = self
            .state
            .store
            .entity(&entity_id)
            .map_or_else(|| entity_id.clone(), |entity| entity.display_name.clone());
        trace!(entity = entity_id.as_str(), "hover dispatch");
        Some(TooltipEvent::Show {
            entity_id,
            display_name,
            x: anchor_x + margin.left,
            y: anchor_y + margin.top,
        })
    }

    pub fn pointer_leave(&mut self) -> TooltipEvent {
        TooltipEvent::Hide
    }

    /// Applies or clears the faded state on the groups currently shown.
    pub fn filter(&mut self, filter: &Filter) {
        let faded: HashSet<String> = self
            .scene
            .entity_ids()
            .into_iter()
            .filter(|id| {
                self.state
                    .store
                    .entity(id)
                    .is_some_and(|entity| !filter.includes(entity))
            })
            .map(str::to_owned)
            .collect();
        debug!(faded = faded.len(), "filter applied");
        self.scene.set_faded(|view| faded.contains(&view.id));
    }

    #[must_use]
    pub fn frame(&self) -> RenderFrame {
        self.scene.frame()
    }

    /// Samples the scene and hands the frame to the renderer.
    pub fn render(&mut self) -> NarrativeResult<()> {
        let frame = self.scene.frame();
        self.renderer.render(&frame)
    }
}

fn scene_layout(config: &NarrativeConfig, viewport: Viewport) -> SceneLayout {
    SceneLayout {
        viewport,
        margin: config.margin,
        font_size: config.font_size,
        annotation_padding: config.min_radius,
        annotation_wrap: config.annotation_wrap,
    }
}
