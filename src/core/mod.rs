pub mod axis;
pub mod entity;
pub mod line_path;
pub mod primitives;
pub mod scale;
pub mod scale_factory;
pub mod ticks;
pub mod time_interval;
pub mod time_scale;
pub mod types;
pub mod voronoi;

pub use axis::{AxisTick, TimeTickMode, time_axis_ticks, time_tick_label, value_axis_ticks};
pub use entity::{
    Entity, EntityStore, EntityView, EntityWindowing, PageviewPoint, TrimWindow, trim_pageviews,
};
pub use line_path::{build_line_path, interpolate_paths, path_length};
pub use scale::{LinearScale, SqrtScale};
pub use scale_factory::{ScaleFactory, ScaleSet};
pub use time_interval::TimeInterval;
pub use time_scale::TimeScale;
pub use types::{Margin, Viewport, WindowSize};
pub use voronoi::VoronoiDiagram;
