pub mod buffer;
pub mod pipeline;
pub mod request;
