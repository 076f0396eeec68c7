use crate::{
    core::{grid::TileGrid, viewport::Viewport},
    layers::base::{Layer, LayerTrait},
    prelude::HashMap,
    rendering::canvas::Canvas,
    MapError, Result,
};

/// Holds the layers of a map and renders them in insertion order
#[derive(Debug, Default)]
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Layer>,
    /// Layer IDs in the order they were added
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer; ids must be unique
    pub fn add_layer(&mut self, layer: impl Into<Layer>) -> Result<()> {
        let layer = layer.into();
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Config(format!("duplicate layer id '{layer_id}'")));
        }
        self.layers.insert(layer_id.clone(), layer);
        self.render_order.push(layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Layer> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.get(layer_id)
    }

    pub fn get_layer_mut(&mut self, layer_id: &str) -> Option<&mut Layer> {
        self.layers.get_mut(layer_id)
    }

    /// Gets all layers in render order
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id))
    }

    /// Renders every visible layer in order; the first error stops the pass
    pub fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        for layer in self.layers().filter(|layer| layer.is_visible()) {
            log::debug!("rendering {} layer '{}'", layer.layer_type(), layer.id());
            layer.render(canvas, grid, viewport)?;
        }
        Ok(())
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
