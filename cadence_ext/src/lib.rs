pub mod colour;
pub mod image;
pub mod pretty;

pub use ::image::ImageError;
