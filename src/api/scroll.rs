use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Vertical scroll direction, derived from consecutive scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    Down,
    Up,
}

/// Document-space extent of one observed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRegion {
    /// Step name carried by the block; free-form for hover regions.
    pub name: String,
    pub top: f64,
    pub bottom: f64,
}

impl ScrollRegion {
    #[must_use]
    pub fn new(name: impl Into<String>, top: f64, bottom: f64) -> Self {
        Self {
            name: name.into(),
            top,
            bottom,
        }
    }

    fn contains(&self, offset: f64) -> bool {
        offset >= self.top && offset < self.bottom
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScrollEvent {
    Enter {
        index: usize,
        name: String,
        direction: ScrollDirection,
    },
    Exit {
        index: usize,
        name: String,
        direction: ScrollDirection,
    },
}

/// Tracks which region a trigger line sits in.
///
/// The trigger line is `scroll_y + offset * window_height`; crossing into a
/// region emits `Enter`, leaving it emits `Exit`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTracker {
    offset: f64,
    regions: Vec<ScrollRegion>,
    active: Option<usize>,
    last_scroll_y: Option<f64>,
}

impl ScrollTracker {
    #[must_use]
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            regions: Vec::new(),
            active: None,
            last_scroll_y: None,
        }
    }

    /// Replaces the observed regions; the active region is re-evaluated on
    /// the next `update`.
    pub fn set_regions(&mut self, regions: Vec<ScrollRegion>) {
        self.regions = regions;
        self.active = None;
    }

    #[must_use]
    pub fn regions(&self) -> &[ScrollRegion] {
        &self.regions
    }

    #[must_use]
    pub fn active(&self) -> Option<&ScrollRegion> {
        self.active.and_then(|index| self.regions.get(index))
    }

    pub fn update(&mut self, scroll_y: f64, window_height: f64) -> SmallVec<[ScrollEvent; 2]> {
        let direction = match self.last_scroll_y {
            Some(last) if scroll_y < last => ScrollDirection::Up,
            _ => ScrollDirection::Down,
        };
        self.last_scroll_y = Some(scroll_y);

        let trigger = scroll_y + self.offset * window_height;
        let next = self
            .regions
            .iter()
            .position(|region| region.contains(trigger));

        let mut events = SmallVec::new();
        if next == self.active {
            return events;
        }
        if let Some(index) = self.active {
            if let Some(region) = self.regions.get(index) {
                events.push(ScrollEvent::Exit {
                    index,
                    name: region.name.clone(),
                    direction,
                });
            }
        }
        if let Some(index) = next {
            events.push(ScrollEvent::Enter {
                index,
                name: self.regions[index].name.clone(),
                direction,
            });
        }
        self.active = next;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ScrollTracker {
        let mut tracker = ScrollTracker::new(0.5);
        tracker.set_regions(vec![
            ScrollRegion::new("a", 100.0, 200.0),
            ScrollRegion::new("b", 200.0, 300.0),
        ]);
        tracker
    }

    #[test]
    fn entering_and_leaving_regions_emit_events() {
        let mut tracker = tracker();
        assert!(tracker.update(0.0, 100.0).is_empty());

        let events = tracker.update(60.0, 100.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ScrollEvent::Enter { index: 0, direction: ScrollDirection::Down, .. }
        ));

        let events = tracker.update(160.0, 100.0);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ScrollEvent::Exit { index: 0, .. }));
        assert!(matches!(&events[1], ScrollEvent::Enter { index: 1, .. }));

        let events = tracker.update(100.0, 100.0);
        assert!(matches!(
            &events[1],
            ScrollEvent::Enter { index: 0, direction: ScrollDirection::Up, .. }
        ));
    }
}
