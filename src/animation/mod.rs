pub mod ease;
pub mod interp;
pub mod keyframe;
pub mod shape;
