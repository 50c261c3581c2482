use chrono::{Duration, TimeZone, Utc};
use narrative_rs::core::{PageviewPoint, TrimWindow, trim_pageviews};
use proptest::prelude::*;

fn points(indices: &[Option<i32>]) -> Vec<PageviewPoint> {
    let origin = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
    indices
        .iter()
        .enumerate()
        .map(|(offset, index)| {
            let date = origin + Duration::days(offset as i64);
            PageviewPoint {
                entity_id: "p".to_owned(),
                date,
                timestamp: date.format("%Y%m%d").to_string(),
                views_adjusted: offset as f64 + 1.0,
                bin_death_index: *index,
                death_views_adjusted_2: 0.0,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn trim_keeps_exactly_the_indexed_points_inside_the_window(
        indices in prop::collection::vec(prop::option::of(-100i32..100), 0..200),
        start in -120i32..20,
        span in 0i32..120,
    ) {
        let input = points(&indices);
        let snapshot = input.clone();
        let window = TrimWindow::new(start, start + span);

        let trimmed = trim_pageviews(&input, window);

        prop_assert_eq!(&input, &snapshot);
        let expected = indices
            .iter()
            .flatten()
            .filter(|index| window.contains(**index))
            .count();
        prop_assert_eq!(trimmed.len(), expected);
        prop_assert!(trimmed.iter().all(|point| point
            .bin_death_index
            .is_some_and(|index| index >= window.start && index <= window.end)));
        prop_assert!(trimmed.windows(2).all(|pair| pair[0].date < pair[1].date));
    }
}
