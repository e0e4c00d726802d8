use crate::layers::base::OverlayLayer;
use crate::prelude::HashMap;
use crate::{MapError, Result};

/// Owns the overlays on a map, ordered by z-index
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn OverlayLayer>>,
    /// Ordered list of layer IDs (sorted by z-index, then insertion)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer to the manager. IDs must be unique.
    pub fn add_layer(&mut self, layer: Box<dyn OverlayLayer>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("duplicate layer id {layer_id}")));
        }
        let z_index = layer.z_index();

        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn OverlayLayer>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn OverlayLayer> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Mutable access to a layer by ID
    pub fn get_layer_mut(&mut self, layer_id: &str) -> Option<&mut (dyn OverlayLayer + 'static)> {
        self.layers.get_mut(layer_id).map(|l| l.as_mut())
    }

    /// Layer IDs bottom to top
    pub fn ids(&self) -> &[String] {
        &self.render_order
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

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}
