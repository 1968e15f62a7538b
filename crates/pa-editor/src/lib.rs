pub mod bindings;
pub mod canvas;
pub mod decoder;
pub mod editors;
pub mod input;
pub mod painter;
pub mod registry;
pub mod selector;
pub mod shortcuts;

pub use bindings::{HostBindings, TextInput, TextRequest, TextSelection, TextSpan};
pub use canvas::{Layer, PageCanvas};
pub use painter::{HostEvent, Painter, PainterMode};
