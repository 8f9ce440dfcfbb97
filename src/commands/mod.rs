pub mod render;
pub mod scan;
pub mod status;
