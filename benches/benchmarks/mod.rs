pub mod parameter;
pub mod texture;
