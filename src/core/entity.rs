use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NarrativeError, NarrativeResult};

/// One cleaned pageview sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageviewPoint {
    /// Owning entity id.
    pub entity_id: String,
    pub date: DateTime<Utc>,
    /// Compact `YYYYMMDD` day key; circles are joined on it.
    pub timestamp: String,
    pub views_adjusted: f64,
    /// Signed day offset from the date of death (`0` = death day). `None` for
    /// date-windowed entities.
    pub bin_death_index: Option<i32>,
    pub death_views_adjusted_2: f64,
}

impl PageviewPoint {
    #[must_use]
    pub fn is_death_day(&self) -> bool {
        self.bin_death_index == Some(0)
    }
}

/// How an entity's pageviews are windowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityWindowing {
    /// Indexed relative to a date of death.
    DeathIndexed { timestamp_of_death: DateTime<Utc> },
    /// Windowed by calendar dates, no death reference.
    DateWindowed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    pub pageviews: Vec<PageviewPoint>,
    pub windowing: EntityWindowing,
    pub perspective_show: bool,
    /// Position in the metadata list the entity was loaded from.
    pub load_index: usize,
    pub attributes: IndexMap<String, Value>,
}

impl Entity {
    #[must_use]
    pub fn timestamp_of_death(&self) -> Option<DateTime<Utc>> {
        match self.windowing {
            EntityWindowing::DeathIndexed { timestamp_of_death } => Some(timestamp_of_death),
            EntityWindowing::DateWindowed { .. } => None,
        }
    }

    #[must_use]
    pub fn death_day_point(&self) -> Option<&PageviewPoint> {
        self.pageviews.iter().find(|point| point.is_death_day())
    }

    /// Full, untrimmed view of this entity.
    #[must_use]
    pub fn view(&self) -> EntityView {
        self.view_with(self.pageviews.clone())
    }

    /// View restricted to `window` (see [`trim_pageviews`]).
    #[must_use]
    pub fn trimmed_view(&self, window: TrimWindow) -> EntityView {
        self.view_with(trim_pageviews(&self.pageviews, window))
    }

    fn view_with(&self, pageviews: Vec<PageviewPoint>) -> EntityView {
        EntityView {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            pageviews,
            timestamp_of_death: self.timestamp_of_death(),
            perspective_show: self.perspective_show,
            load_index: self.load_index,
            magnitude: self
                .death_day_point()
                .or_else(|| self.pageviews.first())
                .map(|point| point.death_views_adjusted_2),
        }
    }

    /// Checks the ordering invariants every cleaned entity must hold.
    pub fn validate(&self) -> NarrativeResult<()> {
        for pair in self.pageviews.windows(2) {
            if pair[1].date < pair[0].date {
                return Err(NarrativeError::InvalidData(format!(
                    "pageviews of `{}` are not time ordered",
                    self.id
                )));
            }
            if let (Some(left), Some(right)) = (pair[0].bin_death_index, pair[1].bin_death_index) {
                if right < left {
                    return Err(NarrativeError::InvalidData(format!(
                        "bin death index of `{}` decreases at {}",
                        self.id, pair[1].timestamp
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Derived, per-step copy of an entity handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: String,
    pub display_name: String,
    pub pageviews: Vec<PageviewPoint>,
    pub timestamp_of_death: Option<DateTime<Utc>>,
    pub perspective_show: bool,
    pub load_index: usize,
    /// `death_views_adjusted_2` of the canonical entity, drives the radius scale.
    pub magnitude: Option<f64>,
}

impl EntityView {
    #[must_use]
    pub fn death_day_point(&self) -> Option<&PageviewPoint> {
        self.pageviews.iter().find(|point| point.is_death_day())
    }
}

/// Inclusive death-relative index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: i32,
    pub end: i32,
}

impl TrimWindow {
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(self, index: i32) -> bool {
        index >= self.start && index <= self.end
    }
}

impl Default for TrimWindow {
    fn default() -> Self {
        Self { start: -1, end: 0 }
    }
}

/// Copies the points whose `bin_death_index` falls inside `window`.
///
/// The input is never mutated; points without a death index are dropped.
#[must_use]
pub fn trim_pageviews(points: &[PageviewPoint], window: TrimWindow) -> Vec<PageviewPoint> {
    points
        .iter()
        .filter(|point| {
            point
                .bin_death_index
                .is_some_and(|index| window.contains(index))
        })
        .cloned()
        .collect()
}

/// Immutable, cleaned dataset for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    people: Vec<Entity>,
    comparison: Entity,
    population_pageviews: Vec<PageviewPoint>,
}

impl EntityStore {
    pub fn new(
        people: Vec<Entity>,
        comparison: Entity,
        population_pageviews: Vec<PageviewPoint>,
    ) -> NarrativeResult<Self> {
        for entity in people.iter().chain(std::iter::once(&comparison)) {
            entity.validate()?;
        }
        if comparison.pageviews.is_empty() {
            return Err(NarrativeError::InvalidData(format!(
                "comparison entity `{}` has no pageviews inside its date window",
                comparison.id
            )));
        }
        Ok(Self {
            people,
            comparison,
            population_pageviews,
        })
    }

    /// Death-indexed entities in load order.
    #[must_use]
    pub fn people(&self) -> &[Entity] {
        &self.people
    }

    /// The date-windowed comparison entity.
    #[must_use]
    pub fn comparison(&self) -> &Entity {
        &self.comparison
    }

    /// Every cleaned row of the multi-entity table in source order.
    #[must_use]
    pub fn population_pageviews(&self) -> &[PageviewPoint] {
        &self.population_pageviews
    }

    #[must_use]
    pub fn person(&self, id: &str) -> Option<&Entity> {
        self.people.iter().find(|entity| entity.id == id)
    }

    /// Looks up either a person or the comparison entity.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        if self.comparison.id == id {
            return Some(&self.comparison);
        }
        self.person(id)
    }

    /// Trimmed views of every person, ordered by ascending date of death.
    ///
    /// The sort is stable, so ties keep load order.
    #[must_use]
    pub fn population_by_death(&self, window: TrimWindow) -> Vec<EntityView> {
        let mut views: Vec<EntityView> = self
            .people
            .iter()
            .map(|entity| entity.trimmed_view(window))
            .collect();
        views.sort_by_key(|view| view.timestamp_of_death);
        views
    }
}
