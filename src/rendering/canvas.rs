//! The drawing capability layers paint through.

use crate::{
    core::{geo::Point, matrix::Matrix},
    rendering::style::{Style, TextStyle},
};
use image::RgbaImage;
use std::ops::{Deref, DerefMut};

/// A 2D drawing surface with a save/restore state stack.
///
/// Geometry passed to the draw calls is in local units; the current transform
/// (built with [`Canvas::concat_transform`]) maps it to device pixels.
/// Images are composited in device pixels and ignore the transform.
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Pushes the current transform and drawing state
    fn save(&mut self);

    /// Pops the state pushed by the matching [`Canvas::save`]
    fn restore(&mut self);

    /// Pre-multiplies `matrix` onto the current transform, so it applies to
    /// local coordinates before the existing transform does.
    fn concat_transform(&mut self, matrix: &Matrix);

    /// Updates the fields of the drawing state that `style` sets
    fn apply_style(&mut self, style: &Style);

    /// Filled and stroked circle
    fn draw_circle(&mut self, center: Point, radius: f64);

    /// Open stroked line through `points`
    fn draw_polyline(&mut self, points: &[Point]);

    /// Filled (even-odd) and stroked ring set; first ring outer, rest holes
    fn draw_polygon(&mut self, rings: &[Vec<Point>]);

    fn draw_text(&mut self, position: Point, text: &str, style: &TextStyle);

    /// Composites `image` with its top-left corner at device pixel `(x, y)`
    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64);
}

/// Scoped drawing state: saves on creation and restores when dropped, so the
/// state is released on every exit path including early `?` returns.
pub struct StateGuard<'a> {
    canvas: &'a mut dyn Canvas,
}

impl<'a> StateGuard<'a> {
    pub fn new(canvas: &'a mut dyn Canvas) -> Self {
        canvas.save();
        Self { canvas }
    }
}

impl<'a> Deref for StateGuard<'a> {
    type Target = dyn Canvas + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.canvas
    }
}

impl<'a> DerefMut for StateGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.canvas
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::recording::{DrawCommand, RecordingCanvas};

    fn failing_draw(canvas: &mut dyn Canvas) -> crate::Result<()> {
        let mut guard = StateGuard::new(canvas);
        guard.concat_transform(&Matrix::translation(5.0, 5.0));
        Err(crate::MapError::Render("boom".to_string()))
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        let mut canvas = RecordingCanvas::new(10, 10);
        assert!(failing_draw(&mut canvas).is_err());

        assert_eq!(canvas.depth(), 0);
        assert_eq!(canvas.transform(), Matrix::identity());
        assert_eq!(
            canvas.commands().first(),
            Some(&DrawCommand::Save),
        );
        assert_eq!(canvas.commands().last(), Some(&DrawCommand::Restore));
    }

    #[test]
    fn test_nested_guards() {
        let mut canvas = RecordingCanvas::new(10, 10);
        {
            let mut outer = StateGuard::new(&mut canvas);
            outer.concat_transform(&Matrix::translation(1.0, 0.0));
            {
                let mut inner = StateGuard::new(&mut *outer);
                inner.concat_transform(&Matrix::translation(0.0, 2.0));
                inner.draw_circle(Point::new(0.0, 0.0), 1.0);
            }
            outer.draw_circle(Point::new(0.0, 0.0), 1.0);
        }
        assert_eq!(canvas.depth(), 0);

        let centers: Vec<Point> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { center, .. } => Some(*center),
                _ => None,
            })
            .collect();
        assert_eq!(centers, vec![Point::new(1.0, 2.0), Point::new(1.0, 0.0)]);
    }
}
