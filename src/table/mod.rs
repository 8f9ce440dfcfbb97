pub mod dataset;
pub mod render;
pub mod rowspan;
pub mod script;

pub use dataset::Dataset;
pub use render::{LinkStrategy, RenderOptions, TableRenderer};
pub use script::{PopupOptions, popup_script, standalone_page};
