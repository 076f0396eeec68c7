//! Macros to reduce boilerplate in layer implementations
//!
//! Every concrete layer keeps its identity in a
//! [`LayerProperties`](crate::layers::base::LayerProperties) field; these
//! macros generate the accessors around it and the dispatch of the closed
//! [`Layer`](crate::layers::base::Layer) enum.

/// Implements the property accessors of `LayerTrait` for a layer storing
/// its properties in `$properties_field`.
///
/// Usage, inside `impl LayerTrait for MyLayer { ... }`:
/// ```ignore
/// impl_layer_trait!(properties);
/// ```
#[macro_export]
macro_rules! impl_layer_trait {
    ($properties_field:ident) => {
        fn id(&self) -> &str {
            &self.$properties_field.id
        }

        fn name(&self) -> &str {
            &self.$properties_field.name
        }

        fn layer_type(&self) -> $crate::layers::base::LayerType {
            self.$properties_field.layer_type
        }

        fn is_visible(&self) -> bool {
            self.$properties_field.visible
        }

        fn set_visible(&mut self, visible: bool) {
            self.$properties_field.visible = visible;
        }
    };
}

/// Builder methods shared by all layers: `with_name` and `hidden`
#[macro_export]
macro_rules! impl_layer_builders {
    ($properties_field:ident) => {
        /// Sets the display name; defaults to the id
        pub fn with_name(mut self, name: impl Into<String>) -> Self {
            self.$properties_field.name = name.into();
            self
        }

        /// Starts the layer invisible
        pub fn hidden(mut self) -> Self {
            self.$properties_field.visible = false;
            self
        }
    };
}

/// Generates the `Layer` enum, its `LayerTrait` delegation and a `From`
/// conversion for every variant.
#[macro_export]
macro_rules! layer_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident($inner:ty)),+ $(,)? }) => {
        $(#[$meta])*
        pub enum $name {
            $($variant($inner)),+
        }

        impl $crate::layers::base::LayerTrait for $name {
            fn id(&self) -> &str {
                match self { $($name::$variant(layer) => layer.id()),+ }
            }

            fn name(&self) -> &str {
                match self { $($name::$variant(layer) => layer.name()),+ }
            }

            fn layer_type(&self) -> $crate::layers::base::LayerType {
                match self { $($name::$variant(layer) => layer.layer_type()),+ }
            }

            fn is_visible(&self) -> bool {
                match self { $($name::$variant(layer) => layer.is_visible()),+ }
            }

            fn set_visible(&mut self, visible: bool) {
                match self { $($name::$variant(layer) => layer.set_visible(visible)),+ }
            }

            fn render(
                &self,
                canvas: &mut dyn $crate::rendering::canvas::Canvas,
                grid: &$crate::core::grid::TileGrid,
                viewport: &$crate::core::viewport::Viewport,
            ) -> $crate::Result<()> {
                match self { $($name::$variant(layer) => layer.render(canvas, grid, viewport)),+ }
            }
        }

        $(
            impl From<$inner> for $name {
                fn from(layer: $inner) -> Self {
                    $name::$variant(layer)
                }
            }
        )+
    };
}
