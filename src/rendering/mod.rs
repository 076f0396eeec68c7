pub mod canvas;
pub mod pixmap;
pub mod recording;
pub mod style;

// Re-export main types
pub use canvas::{Canvas, StateGuard};
pub use pixmap::PixmapCanvas;
pub use recording::{DrawCommand, RecordingCanvas};
pub use style::{Color, DrawState, LineCap, LineJoin, Style, TextAlign, TextDecoration, TextStyle};
