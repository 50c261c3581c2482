use crate::error::NarrativeResult;
use crate::render::{RenderFrame, Renderer};

/// No-op renderer used by tests and headless sessions.
///
/// It still validates frame content so tests can catch invalid geometry
/// before a drawing backend is involved.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_group_count: usize,
    pub last_circle_count: usize,
    pub last_text_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> NarrativeResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_group_count = frame.people.len();
        self.last_circle_count = frame.people.iter().map(|group| group.circles.len()).sum();
        self.last_text_count = frame.axis_texts.len()
            + frame
                .annotations
                .iter()
                .map(|annotation| annotation.title.len())
                .sum::<usize>();
        Ok(())
    }
}
