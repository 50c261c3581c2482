//! Step handlers.
//!
//! Every handler is a pure function of the session state and a
//! [`StepContext`]; it returns absolute attribute targets, so plans can be
//! applied back to back without waiting for earlier animations.

use kurbo::{Point, Rect};
use smallvec::SmallVec;
use tracing::debug;

use crate::animation::Timing;
use crate::api::{Durations, NarrativeState, Step, StepContext, StepPlan};
use crate::core::{
    EntityView, PageviewPoint, ScaleSet, TimeTickMode, TrimWindow, VoronoiDiagram, time_axis_ticks,
    value_axis_ticks,
};
use crate::error::NarrativeResult;
use crate::render::{
    AnnotationSpec, CircleAnimation, CircleFilter, DelayRule, EntityFilter, Gate, HighlightRule,
    PathRedraw, PathUpdate, ScenePlan, SceneOp, Selection, ValueRule, WatchTarget,
};

/// Plans produced by one step call, in application order.
pub type StepPlans = SmallVec<[StepPlan; 2]>;

/// Plans `step`. A forward, non-leave entry first fast-forwards through the
/// previous step.
pub fn plan_step(
    state: &NarrativeState,
    step: Step,
    context: StepContext,
) -> NarrativeResult<StepPlans> {
    let mut plans = StepPlans::new();
    if !context.reverse && !context.leave {
        if let Some(previous) = step.previous() {
            plans.push(plan_single(state, previous, StepContext::leave())?);
        }
    }
    plans.push(plan_single(state, step, context)?);
    Ok(plans)
}

/// Plans `step` alone, without leave chaining.
pub fn plan_single(
    state: &NarrativeState,
    step: Step,
    context: StepContext,
) -> NarrativeResult<StepPlan> {
    let durations = Durations::for_context(&state.config, context);
    debug!(
        step = step.name(),
        reverse = context.reverse,
        leave = context.leave,
        slow_ms = durations.slow,
        "plan step"
    );
    let planner = Planner {
        state,
        context,
        durations,
    };
    let scene = match step {
        Step::Context => planner.context()?,
        Step::Lemonade => planner.lemonade()?,
        Step::PrinceBefore => planner.prince_before()?,
        Step::PrinceSpike => planner.prince_spike()?,
        Step::Others => planner.others()?,
        Step::Compare => planner.compare()?,
    };
    Ok(StepPlan {
        step,
        context,
        durations,
        scene,
    })
}

struct Planner<'a> {
    state: &'a NarrativeState,
    context: StepContext,
    durations: Durations,
}

impl Planner<'_> {
    fn min_r(&self) -> f64 {
        self.state.config.min_radius
    }

    fn max_r(&self) -> f64 {
        self.state.config.max_radius
    }

    fn focus(&self) -> EntityFilter {
        EntityFilter::Only(self.state.config.focus_id.clone())
    }

    fn named(&self) -> Vec<String> {
        vec![
            self.state.config.comparison_id.clone(),
            self.state.config.focus_id.clone(),
        ]
    }

    /// `max_r` on the death-day marker, `min_r` elsewhere.
    fn death_day_radius(&self) -> ValueRule {
        ValueRule::DeathDay {
            death_day: self.max_r(),
            other: self.min_r(),
        }
    }

    fn death_day_stroke(&self) -> ValueRule {
        ValueRule::DeathDay {
            death_day: self.max_r() / 2.0,
            other: self.min_r() / 2.0,
        }
    }

    fn comparison_view(&self) -> EntityView {
        self.state.store.comparison().view()
    }

    fn focus_view(&self, window: TrimWindow) -> NarrativeResult<EntityView> {
        Ok(self.state.focus()?.trimmed_view(window))
    }

    /// Scales over the comparison window, optionally with a custom y window.
    fn comparison_scales(&self, y_window: Option<&[PageviewPoint]>) -> NarrativeResult<ScaleSet> {
        let factory = self.state.scale_factory()?;
        let default = &self.state.store.comparison().pageviews;
        factory.scales(default, y_window.unwrap_or(default), None)
    }

    fn population_scales(
        &self,
        views: &[EntityView],
        with_radius: bool,
    ) -> NarrativeResult<ScaleSet> {
        let factory = self.state.scale_factory()?;
        let population = self.state.store.population_pageviews();
        let r = if with_radius {
            factory.r(views.iter().filter_map(|view| view.magnitude))?
        } else {
            None
        };
        factory.scales(population, population, r)
    }

    fn axis(&self, scales: &ScaleSet, duration_ms: f64, mode: TimeTickMode) -> SceneOp {
        let config = &self.state.config;
        SceneOp::Axis {
            duration_ms,
            y_ticks: value_axis_ticks(scales.y, &config.value_unit_label, config.value_unit_tick),
            x_ticks: time_axis_ticks(scales.x, mode),
        }
    }

    fn join(&self, entities: Vec<EntityView>) -> SceneOp {
        SceneOp::Join {
            entities,
            exit_duration_ms: self.durations.fast,
        }
    }

    fn no_annotations() -> SceneOp {
        SceneOp::Annotations {
            specs: Vec::new(),
            duration_ms: 0.0,
            delay_ms: 0.0,
        }
    }

    /// Shared body of the two comparison-entity steps.
    fn comparison_base(&self) -> NarrativeResult<ScenePlan> {
        let scales = self.comparison_scales(None)?;
        let mut plan = ScenePlan::new(scales, self.state.config.ease);
        plan.push(self.axis(&scales, 0.0, TimeTickMode::Monthly));
        plan.push(self.join(vec![self.comparison_view()]));
        plan.push(SceneOp::BindPaths {
            selection: Selection::Merged,
            entities: EntityFilter::All,
            redraw: true,
        });
        plan.push(SceneOp::BindCircles {
            selection: Selection::Merged,
            entities: EntityFilter::All,
            named: self.named(),
            enter_radius: self.min_r(),
        });
        plan.push(SceneOp::Highlight(HighlightRule::All));
        Ok(plan)
    }

    fn context(&self) -> NarrativeResult<ScenePlan> {
        let mut plan = self.comparison_base()?;
        plan.push(SceneOp::AnimateCircles(
            CircleAnimation::new(
                Selection::Merged,
                EntityFilter::All,
                Timing::new(self.durations.fast),
            )
            .with_radius(ValueRule::Fixed(self.min_r()))
            .with_stroke_width(ValueRule::Fixed(self.min_r() / 2.0)),
        ));
        plan.push(Self::no_annotations());
        Ok(plan)
    }

    fn lemonade(&self) -> NarrativeResult<ScenePlan> {
        let config = &self.state.config;
        let mut plan = self.comparison_base()?;
        plan.push(SceneOp::AnimateCircles(
            CircleAnimation::new(
                Selection::Merged,
                EntityFilter::All,
                Timing::new(self.durations.fast),
            )
            .with_circles(CircleFilter::Timestamp(config.release_timestamp.clone()))
            .with_radius(ValueRule::Fixed(self.max_r()))
            .with_stroke_width(ValueRule::Fixed(self.max_r() / 2.0))
            .repositioned(),
        ));

        let specs = self
            .state
            .store
            .comparison()
            .pageviews
            .last()
            .map(|last| AnnotationSpec {
                date: last.date,
                value: last.views_adjusted,
                title: config.release_title.clone(),
                padding: config.font_size * 0.5,
                dx: -50.0,
                dy: 50.0,
                radius: self.max_r() * 1.25,
            })
            .into_iter()
            .collect();
        plan.push(SceneOp::Annotations {
            specs,
            duration_ms: self.durations.fast,
            delay_ms: 0.0,
        });
        Ok(plan)
    }

    fn prince_before(&self) -> NarrativeResult<ScenePlan> {
        let durations = self.durations;
        let start = self.state.focus_start()?;
        let entities = vec![
            self.focus_view(TrimWindow::new(start, -1))?,
            self.comparison_view(),
        ];
        let scales = self.comparison_scales(None)?;
        let mut plan = ScenePlan::new(scales, self.state.config.ease);
        plan.push(self.axis(&scales, durations.slow, TimeTickMode::Monthly));
        plan.push(self.join(entities));
        plan.push(SceneOp::BindCircles {
            selection: Selection::Merged,
            entities: EntityFilter::All,
            named: self.named(),
            enter_radius: self.min_r(),
        });
        plan.push(SceneOp::BindPaths {
            selection: Selection::Merged,
            entities: EntityFilter::All,
            redraw: !self.context.reverse,
        });

        if self.context.reverse {
            plan.push(SceneOp::AnimatePaths(
                PathUpdate::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.slow),
                )
                .with_redraw(PathRedraw::Tween)
                .with_dash_offset(0.0)
                .with_opacity(1.0),
            ));
            plan.push(SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.slow),
                )
                .with_opacity(ValueRule::Fixed(1.0))
                .with_radius(ValueRule::Fixed(self.min_r()))
                .repositioned(),
            ));
        } else {
            plan.push(SceneOp::ResetDash {
                entities: self.focus(),
            });
            plan.push(SceneOp::AnimatePaths(
                PathUpdate::new(Selection::Merged, self.focus(), Timing::new(durations.slow))
                    .with_dash_offset(0.0),
            ));
            plan.push(SceneOp::SnapCircleRadius {
                entities: self.focus(),
                radius: 0.0,
            });
            plan.push(SceneOp::AnimateCircles(
                CircleAnimation::new(Selection::Merged, self.focus(), Timing::new(durations.fast))
                    .with_delay(DelayRule::EasedIndex {
                        span: durations.slow,
                    })
                    .with_radius(self.death_day_radius())
                    .with_stroke_width(self.death_day_stroke()),
            ));
            plan.push(SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    EntityFilter::Only(self.state.config.comparison_id.clone()),
                    Timing::new(durations.fast),
                )
                .with_radius(ValueRule::Fixed(self.min_r()))
                .with_stroke_width(ValueRule::Fixed(self.min_r() / 2.0)),
            ));
        }

        plan.push(Self::no_annotations());
        plan.push(SceneOp::Highlight(HighlightRule::Only(
            self.state.config.focus_id.clone(),
        )));
        plan.push(SceneOp::Raise(self.focus()));
        Ok(plan)
    }

    /// Second phase of `prince-spike`: extend the focus line to the death
    /// day and grow its marker.
    fn add_spike(&self) -> Vec<SceneOp> {
        let durations = self.durations;
        let reveal = !self.context.leave && !self.context.reverse;
        let path_duration = if self.context.leave {
            0.0
        } else {
            durations.slow
        };
        vec![
            SceneOp::ExtendReveal {
                entities: self.focus(),
                reveal,
            },
            SceneOp::BindCircles {
                selection: Selection::Merged,
                entities: self.focus(),
                named: self.named(),
                enter_radius: 0.0,
            },
            SceneOp::AnimatePaths(
                PathUpdate::new(Selection::Merged, self.focus(), Timing::new(path_duration))
                    .with_dash_offset(0.0),
            ),
            SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    self.focus(),
                    Timing::new(durations.medium).with_delay(durations.slow),
                )
                .with_radius(self.death_day_radius())
                .with_stroke_width(self.death_day_stroke()),
            ),
        ]
    }

    fn prince_spike(&self) -> NarrativeResult<ScenePlan> {
        let durations = self.durations;
        let config = &self.state.config;
        let start = self.state.focus_start()?;
        let focus = self.focus_view(TrimWindow::new(start, 0))?;
        let scales = self.comparison_scales(Some(&focus.pageviews))?;
        let entities = vec![focus, self.comparison_view()];

        let mut plan = ScenePlan::new(scales, config.ease);
        plan.push(self.axis(&scales, durations.slow, TimeTickMode::Monthly));
        plan.push(self.join(entities));

        if self.context.reverse {
            plan.push(SceneOp::BindCircles {
                selection: Selection::Merged,
                entities: EntityFilter::All,
                named: self.named(),
                enter_radius: 0.0,
            });
            plan.push(SceneOp::BindPaths {
                selection: Selection::Merged,
                entities: EntityFilter::All,
                redraw: false,
            });
            plan.push(SceneOp::SetPaths {
                update: PathUpdate::new(Selection::Merged, EntityFilter::All, Timing::new(0.0))
                    .with_redraw(PathRedraw::Tween)
                    .with_opacity(0.0)
                    .with_dash_offset(0.0),
                clear_dash: true,
            });
            plan.push(SceneOp::AnimatePaths(
                PathUpdate::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.fast).with_delay(durations.slow),
                )
                .with_opacity(1.0),
            ));
            plan.push(SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.slow),
                )
                .with_delay(DelayRule::ForEntity {
                    entity_id: config.comparison_id.clone(),
                    delay: durations.slow,
                    otherwise: 0.0,
                })
                .with_opacity(ValueRule::Fixed(1.0))
                .with_radius(self.death_day_radius())
                .with_stroke_width(self.death_day_stroke())
                .repositioned(),
            ));
        } else {
            plan.push(SceneOp::AnimatePaths(
                PathUpdate::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.slow),
                )
                .with_redraw(PathRedraw::Tween)
                .with_opacity(1.0),
            ));
            if !self.context.leave {
                plan.push(SceneOp::Gated(Gate {
                    entity_id: config.focus_id.clone(),
                    target: WatchTarget::Path,
                    ops: self.add_spike(),
                }));
            }
            plan.push(SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.slow),
                )
                .with_opacity(ValueRule::Fixed(1.0))
                .with_stroke_width(self.death_day_stroke())
                .repositioned(),
            ));
        }

        plan.push(SceneOp::AnimateLabels {
            selection: Selection::Merged,
            timing: Timing::new(durations.fast),
            delay: DelayRule::None,
            opacity: ValueRule::Fixed(0.0),
        });
        plan.push(SceneOp::Highlight(HighlightRule::Only(
            config.focus_id.clone(),
        )));
        plan.push(SceneOp::Raise(self.focus()));
        plan.push(Self::no_annotations());

        if self.context.leave && !self.context.reverse {
            plan.ops.extend(self.add_spike());
        }
        Ok(plan)
    }

    /// Second phase of `others`: magnitude radii and name labels, staggered
    /// by load order.
    fn add_others(&self) -> Vec<SceneOp> {
        let durations = self.durations;
        let population = self.state.store.people().len();
        let stagger = DelayRule::LoadOrder {
            span: durations.slow,
            population,
        };
        vec![
            SceneOp::BindCircles {
                selection: Selection::Merged,
                entities: EntityFilter::All,
                named: self.named(),
                enter_radius: 0.0,
            },
            SceneOp::SetCircleActive(false),
            SceneOp::AnimateCircles(
                CircleAnimation::new(
                    Selection::Merged,
                    EntityFilter::All,
                    Timing::new(durations.medium),
                )
                .with_delay(stagger.clone())
                .with_radius(ValueRule::Magnitude {
                    fallback: self.min_r(),
                })
                .with_stroke_width(ValueRule::Fixed(self.min_r() / 2.0)),
            ),
            SceneOp::PlaceLabels {
                selection: Selection::Merged,
            },
            SceneOp::AnimateLabels {
                selection: Selection::Merged,
                timing: Timing::new(durations.medium),
                delay: if self.context.reverse {
                    DelayRule::None
                } else {
                    stagger
                },
                opacity: ValueRule::PerspectiveShow {
                    shown: 1.0,
                    hidden: 0.0,
                },
            },
            SceneOp::Raise(EntityFilter::PerspectiveShow),
            SceneOp::MarkTransparent,
        ]
    }

    fn others(&self) -> NarrativeResult<ScenePlan> {
        let durations = self.durations;
        let entities = self.state.store.population_by_death(TrimWindow::new(0, 0));
        let scales = self.population_scales(&entities, true)?;

        let mut plan = ScenePlan::new(scales, self.state.config.ease);
        plan.push(self.axis(&scales, durations.slow, TimeTickMode::Auto));
        plan.push(self.join(entities));
        plan.push(SceneOp::AnimatePaths(
            PathUpdate::new(
                Selection::Existing,
                EntityFilter::All,
                Timing::new(durations.fast),
            )
            .with_redraw(PathRedraw::AtEnd)
            .with_opacity(0.0),
        ));
        let marker_duration = if self.context.reverse {
            0.0
        } else {
            durations.medium
        };
        plan.push(SceneOp::AnimateCircles(
            CircleAnimation::new(
                Selection::Existing,
                EntityFilter::All,
                Timing::new(marker_duration),
            )
            .with_opacity(ValueRule::DeathDay {
                death_day: 1.0,
                other: 0.0,
            })
            .repositioned(),
        ));
        if !self.context.leave {
            plan.push(SceneOp::Gated(Gate {
                entity_id: self.state.config.focus_id.clone(),
                target: WatchTarget::FirstCircle,
                ops: self.add_others(),
            }));
        }
        plan.push(SceneOp::Highlight(HighlightRule::None));
        plan.push(Self::no_annotations());

        if self.context.leave && !self.context.reverse {
            plan.ops.extend(self.add_others());
        }
        Ok(plan)
    }

    fn comparison_annotations(&self) -> Vec<AnnotationSpec> {
        let config = &self.state.config;
        let width = self.state.viewport.width;
        config
            .comparison_events
            .iter()
            .map(|event| AnnotationSpec {
                date: event.date,
                value: event.pageviews / event.total_pageviews * config.comparison_median,
                title: event.title.clone(),
                padding: 0.0,
                dx: signed_floor(event.dx_ratio * width),
                dy: signed_floor(event.dy_ratio * width),
                radius: self.max_r() / 2.0,
            })
            .collect()
    }

    fn compare(&self) -> NarrativeResult<ScenePlan> {
        let durations = self.durations;
        let config = &self.state.config;
        let entities = self
            .state
            .store
            .population_by_death(TrimWindow::new(config.compare_trim_start, 0));
        let scales = self.population_scales(&entities, false)?;

        let margin = config.margin;
        let viewport = self.state.viewport;
        let sites = entities
            .iter()
            .map(|view| {
                view.death_day_point().map(|point| {
                    let (x, y) = scales.project(point);
                    Point::new(x, y)
                })
            })
            .collect();
        let diagram = VoronoiDiagram::new(
            sites,
            Rect::new(
                -margin.left,
                -margin.top,
                viewport.width + margin.left,
                viewport.height + margin.top,
            ),
        );
        let entity_ids = entities.iter().map(|view| view.id.clone()).collect();

        let mut plan = ScenePlan::new(scales, config.ease);
        plan.push(self.axis(&scales, durations.slow, TimeTickMode::Auto));
        plan.push(self.join(entities));
        plan.push(SceneOp::AnimatePaths(
            PathUpdate::new(
                Selection::Existing,
                EntityFilter::All,
                Timing::new(durations.slow),
            )
            .with_opacity(0.0),
        ));
        plan.push(SceneOp::AnimateCircles(
            CircleAnimation::new(
                Selection::Existing,
                EntityFilter::All,
                Timing::new(durations.slow),
            )
            .with_opacity(ValueRule::DeathDay {
                death_day: 1.0,
                other: 0.0,
            })
            .repositioned(),
        ));
        plan.push(SceneOp::AnimateLabels {
            selection: Selection::Existing,
            timing: Timing::new(durations.fast),
            delay: DelayRule::None,
            opacity: ValueRule::Fixed(0.0),
        });
        plan.push(SceneOp::Highlight(HighlightRule::None));

        let specs = if self.context.leave && !self.context.reverse {
            Vec::new()
        } else {
            self.comparison_annotations()
        };
        plan.push(SceneOp::Annotations {
            specs,
            duration_ms: 0.0,
            delay_ms: 0.0,
        });
        plan.push(SceneOp::Voronoi {
            entity_ids,
            diagram,
        });
        Ok(plan)
    }
}

/// Floors the magnitude and keeps the sign, so `-3.7` becomes `-3`.
fn signed_floor(value: f64) -> f64 {
    value.signum() * value.abs().floor()
}

#[cfg(test)]
mod tests {
    use super::signed_floor;

    #[test]
    fn signed_floor_truncates_towards_zero() {
        assert_eq!(signed_floor(7.9), 7.0);
        assert_eq!(signed_floor(-7.9), -7.0);
        assert_eq!(signed_floor(0.0), 0.0);
    }
}
