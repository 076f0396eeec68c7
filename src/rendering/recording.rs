use crate::{
    core::{geo::Point, matrix::Matrix},
    rendering::{
        canvas::Canvas,
        style::{DrawState, Style, TextStyle},
    },
};
use image::RgbaImage;

/// Commands recorded by a [`RecordingCanvas`].
///
/// Geometry is stored in device pixels, after the current transform.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Transform(Matrix),
    Style(Style),
    Circle {
        center: Point,
        radius: f64,
        state: DrawState,
    },
    Polyline {
        points: Vec<Point>,
        state: DrawState,
    },
    Polygon {
        rings: Vec<Vec<Point>>,
        state: DrawState,
    },
    Text {
        position: Point,
        text: String,
        style: TextStyle,
    },
    Image {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
}

impl DrawCommand {
    /// True for commands that put pixels on the surface
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DrawCommand::Circle { .. }
                | DrawCommand::Polyline { .. }
                | DrawCommand::Polygon { .. }
                | DrawCommand::Text { .. }
                | DrawCommand::Image { .. }
        )
    }
}

/// Canvas that records draw calls instead of rasterizing them
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    transform: Matrix,
    state: DrawState,
    stack: Vec<(Matrix, DrawState)>,
    /// Drawing primitives in issue order
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Matrix::identity(),
            state: DrawState::default(),
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Only the commands that draw something
    pub fn draw_commands(&self) -> Vec<&DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw()).collect()
    }

    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Number of unmatched saves
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn device(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.transform.transform(*p)).collect()
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.state));
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some((transform, state)) = self.stack.pop() {
            self.transform = transform;
            self.state = state;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn concat_transform(&mut self, matrix: &Matrix) {
        self.transform = Matrix::mul(&self.transform, matrix);
        self.commands.push(DrawCommand::Transform(*matrix));
    }

    fn apply_style(&mut self, style: &Style) {
        self.state.apply(style);
        self.commands.push(DrawCommand::Style(style.clone()));
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        self.commands.push(DrawCommand::Circle {
            center: self.transform.transform(center),
            radius: radius * self.transform.uniform_scale(),
            state: self.state,
        });
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        self.commands.push(DrawCommand::Polyline {
            points: self.device(points),
            state: self.state,
        });
    }

    fn draw_polygon(&mut self, rings: &[Vec<Point>]) {
        self.commands.push(DrawCommand::Polygon {
            rings: rings.iter().map(|ring| self.device(ring)).collect(),
            state: self.state,
        });
    }

    fn draw_text(&mut self, position: Point, text: &str, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            position: self.transform.transform(position),
            text: text.to_string(),
            style: style.clone(),
        });
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        self.commands.push(DrawCommand::Image {
            x,
            y,
            width: image.width(),
            height: image.height(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::style::Color;

    #[test]
    fn test_records_device_coordinates() {
        let mut canvas = RecordingCanvas::new(100, 100);
        canvas.concat_transform(&Matrix::translation(10.0, 20.0));
        canvas.draw_polyline(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);

        match canvas.draw_commands()[0] {
            DrawCommand::Polyline { points, .. } => {
                assert_eq!(points, &vec![Point::new(10.0, 20.0), Point::new(15.0, 25.0)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_restore_rewinds_style() {
        let mut canvas = RecordingCanvas::new(10, 10);
        canvas.save();
        canvas.apply_style(&Style::new().stroke_color(Color::BLACK));
        assert_eq!(canvas.state().stroke_color, Color::BLACK);
        canvas.restore();
        assert_eq!(canvas.state(), DrawState::default());
    }
}
