mod convolution;
pub mod image_source;
pub mod room_acoustics_transformer;
