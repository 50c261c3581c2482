use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::NarrativeConfig;
use crate::core::primitives::{parse_day_stamp, parse_instant, parse_integer_cell, parse_number_cell};
use crate::core::{Entity, EntityStore, EntityWindowing, PageviewPoint};
use crate::error::{NarrativeError, NarrativeResult};

/// One cell of a parsed table: numeric columns may arrive as numbers or as
/// raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    fn number(&self, field_name: &str) -> NarrativeResult<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(raw) => parse_number_cell(raw, field_name),
        }
    }

    fn integer(&self, field_name: &str) -> NarrativeResult<Option<i32>> {
        match self {
            Self::Number(value) if value.fract() == 0.0 => Ok(Some(*value as i32)),
            Self::Number(value) => Err(NarrativeError::InvalidData(format!(
                "{field_name} `{value}` is not an integer"
            ))),
            Self::Text(raw) if raw.trim().is_empty() => Ok(None),
            Self::Text(raw) => parse_integer_cell(raw, field_name).map(Some),
        }
    }

    fn text(&self) -> String {
        match self {
            Self::Number(value) => format!("{value}"),
            Self::Text(raw) => raw.trim().to_owned(),
        }
    }
}

/// Raw pageview row as parsed from a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPageviewRow {
    #[serde(default)]
    pub pageid: Option<String>,
    /// `YYYYMMDD` day key.
    pub timestamp: Cell,
    pub views_adjusted: Cell,
    #[serde(default)]
    pub bin_death_index: Option<Cell>,
    #[serde(default)]
    pub death_views_adjusted_2: Option<Cell>,
    #[serde(default)]
    pub timestamp_of_death: Option<Cell>,
}

/// Person metadata, one entry per death-indexed entity.
///
/// Unknown keys are kept as attributes and are what `filter` matches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub pageid: String,
    #[serde(rename = "display")]
    pub display_name: String,
    #[serde(default)]
    pub perspective_show: bool,
    #[serde(default)]
    pub timestamp_of_death: Option<String>,
    #[serde(flatten)]
    pub attributes: IndexMap<String, Value>,
}

pub fn rows_from_json_str(input: &str) -> NarrativeResult<Vec<RawPageviewRow>> {
    Ok(serde_json::from_str(input)?)
}

pub fn metadata_from_json_str(input: &str) -> NarrativeResult<Vec<EntityMetadata>> {
    Ok(serde_json::from_str(input)?)
}

/// Cleans raw rows into points, keeping source order. `default_id` names
/// rows without a page id.
pub fn clean_pageviews(
    rows: &[RawPageviewRow],
    default_id: &str,
) -> NarrativeResult<Vec<PageviewPoint>> {
    rows.iter()
        .enumerate()
        .map(|(row, raw)| {
            clean_row(raw, default_id).map_err(|err| NarrativeError::DataLoad {
                row,
                reason: err.to_string(),
            })
        })
        .collect()
}

fn clean_row(raw: &RawPageviewRow, default_id: &str) -> NarrativeResult<PageviewPoint> {
    let timestamp = raw.timestamp.text();
    let date = parse_day_stamp(&timestamp)?;
    let views_adjusted = raw.views_adjusted.number("views_adjusted")?;
    let bin_death_index = match &raw.bin_death_index {
        Some(cell) => cell.integer("bin_death_index")?,
        None => None,
    };
    let death_views_adjusted_2 = match &raw.death_views_adjusted_2 {
        Some(cell) => cell.number("death_views_adjusted_2")?,
        None => 0.0,
    };
    Ok(PageviewPoint {
        entity_id: raw
            .pageid
            .clone()
            .unwrap_or_else(|| default_id.to_owned()),
        date,
        timestamp,
        views_adjusted,
        bin_death_index,
        death_views_adjusted_2,
    })
}

/// Builds the session dataset from the person table, the comparison table
/// and the person metadata list.
pub fn build_store(
    config: &NarrativeConfig,
    metadata: &[EntityMetadata],
    population_rows: &[RawPageviewRow],
    comparison_rows: &[RawPageviewRow],
) -> NarrativeResult<EntityStore> {
    let population = clean_pageviews(population_rows, "")?;

    let mut people = Vec::with_capacity(metadata.len());
    for (load_index, meta) in metadata.iter().enumerate() {
        let mut pageviews: Vec<PageviewPoint> = population
            .iter()
            .filter(|point| point.entity_id == meta.pageid)
            .cloned()
            .collect();
        pageviews.sort_by_key(|point| point.date);

        let timestamp_of_death = death_timestamp(meta, population_rows, &pageviews)?;
        people.push(Entity {
            id: meta.pageid.clone(),
            display_name: meta.display_name.clone(),
            pageviews,
            windowing: EntityWindowing::DeathIndexed { timestamp_of_death },
            perspective_show: meta.perspective_show,
            load_index,
            attributes: meta.attributes.clone(),
        });
    }

    let mut comparison_points: Vec<PageviewPoint> =
        clean_pageviews(comparison_rows, &config.comparison_id)?
            .into_iter()
            .filter(|point| point.date >= config.date_start && point.date < config.date_end)
            .map(|mut point| {
                point.entity_id = config.comparison_id.clone();
                point
            })
            .collect();
    comparison_points.sort_by_key(|point| point.date);

    let comparison = Entity {
        id: config.comparison_id.clone(),
        display_name: config.comparison_id.clone(),
        pageviews: comparison_points,
        windowing: EntityWindowing::DateWindowed {
            start: config.date_start,
            end: config.date_end,
        },
        perspective_show: false,
        load_index: metadata.len(),
        attributes: IndexMap::new(),
    };

    debug!(
        people = people.len(),
        rows = population.len(),
        comparison_rows = comparison.pageviews.len(),
        "dataset cleaned"
    );
    EntityStore::new(people, comparison, population)
}

/// Metadata value first, then the first row carrying one, then the death-day
/// point's date.
fn death_timestamp(
    meta: &EntityMetadata,
    rows: &[RawPageviewRow],
    pageviews: &[PageviewPoint],
) -> NarrativeResult<DateTime<Utc>> {
    if let Some(raw) = &meta.timestamp_of_death {
        return parse_instant(raw);
    }
    let from_rows = rows
        .iter()
        .filter(|row| row.pageid.as_deref() == Some(meta.pageid.as_str()))
        .find_map(|row| row.timestamp_of_death.as_ref().map(Cell::text))
        .filter(|raw| !raw.is_empty());
    if let Some(raw) = from_rows {
        return parse_instant(&raw);
    }
    pageviews
        .iter()
        .find(|point| point.is_death_day())
        .map(|point| point.date)
        .ok_or_else(|| {
            NarrativeError::InvalidData(format!(
                "entity `{}` has no date of death",
                meta.pageid
            ))
        })
}
