pub mod pipeline;

pub use pipeline::{EventPipeline, PipelineConfig};
