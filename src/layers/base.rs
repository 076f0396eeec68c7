use crate::{
    core::{grid::TileGrid, viewport::Viewport},
    layers::{
        marker::MarkerLayer,
        shape::{PolygonLayer, PolylineLayer},
        text::TextLayer,
        tile::TileLayer,
        vector::VectorLayer,
    },
    rendering::canvas::Canvas,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Vector,
    Marker,
    Polygon,
    Polyline,
    Text,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Polygon => write!(f, "polygon"),
            LayerType::Polyline => write!(f, "polyline"),
            LayerType::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub visible: bool,
}

impl LayerProperties {
    /// Visible layer whose name is its id
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            layer_type,
            visible: true,
        }
    }
}

/// Something that paints itself onto a canvas for a viewport.
///
/// Layers see only the canvas, never each other's output. Any state pushed
/// on the canvas must be popped before `render` returns, on every path.
pub trait LayerTrait {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn layer_type(&self) -> LayerType;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Draws the layer; the canvas' top-left is the viewport's top-left
    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()>;
}

layer_enum! {
    /// The closed set of layers a renderer can hold
    pub enum Layer {
        Tile(TileLayer),
        Vector(VectorLayer),
        Marker(MarkerLayer),
        Polygon(PolygonLayer),
        Polyline(PolylineLayer),
        Text(TextLayer),
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id())
            .field("type", &self.layer_type())
            .field("visible", &self.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLon;

    #[test]
    fn test_properties_default_name_to_id() {
        let props = LayerProperties::new("roads", LayerType::Polyline);
        assert_eq!(props.name, "roads");
        assert!(props.visible);
    }

    #[test]
    fn test_enum_delegates() {
        let mut layer: Layer = TextLayer::new("label", LatLon::new(0.0, 0.0), "hello")
            .with_name("Label")
            .into();
        assert_eq!(layer.id(), "label");
        assert_eq!(layer.name(), "Label");
        assert_eq!(layer.layer_type(), LayerType::Text);
        assert_eq!(layer.layer_type().to_string(), "text");

        layer.set_visible(false);
        assert!(!layer.is_visible());
    }
}
