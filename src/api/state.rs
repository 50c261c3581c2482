use crate::api::NarrativeConfig;
use crate::core::{Entity, EntityStore, ScaleFactory, Viewport, WindowSize};
use crate::error::{NarrativeError, NarrativeResult};

/// Immutable inputs every step planner reads.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeState {
    pub config: NarrativeConfig,
    pub store: EntityStore,
    pub viewport: Viewport,
}

impl NarrativeState {
    pub fn new(
        config: NarrativeConfig,
        store: EntityStore,
        viewport: Viewport,
    ) -> NarrativeResult<Self> {
        config.validate()?;
        if store.person(&config.focus_id).is_none() {
            return Err(NarrativeError::InvalidConfig(format!(
                "focus entity `{}` is not in the dataset",
                config.focus_id
            )));
        }
        if !viewport.is_valid() {
            return Err(NarrativeError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        Ok(Self {
            config,
            store,
            viewport,
        })
    }

    pub fn focus(&self) -> NarrativeResult<&Entity> {
        self.store.person(&self.config.focus_id).ok_or_else(|| {
            NarrativeError::InvalidData(format!(
                "focus entity `{}` is missing",
                self.config.focus_id
            ))
        })
    }

    /// Bin index of the first focus point strictly after `date_start`,
    /// falling back to the earliest indexed point.
    pub fn focus_start(&self) -> NarrativeResult<i32> {
        let focus = self.focus()?;
        let after_start = focus
            .pageviews
            .iter()
            .find(|point| point.date > self.config.date_start)
            .and_then(|point| point.bin_death_index);
        Ok(after_start
            .or_else(|| {
                focus
                    .pageviews
                    .iter()
                    .find_map(|point| point.bin_death_index)
            })
            .unwrap_or_default())
    }

    /// Scale builder defaulting to the comparison entity's window.
    pub fn scale_factory(&self) -> NarrativeResult<ScaleFactory<'_>> {
        ScaleFactory::new(
            self.viewport,
            (self.config.min_radius, self.config.max_radius),
            &self.store.comparison().pageviews,
        )
    }

    /// Plot area for a host window.
    pub fn viewport_for(config: &NarrativeConfig, window: WindowSize) -> NarrativeResult<Viewport> {
        let height =
            (window.window_height * config.chart_height_ratio).floor() - config.margin.vertical();
        let width = window.chart_width - config.margin.horizontal();
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            return Err(NarrativeError::InvalidViewport { width, height });
        }
        Ok(viewport)
    }
}
