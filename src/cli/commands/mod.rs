pub mod members;
pub mod normalize;
