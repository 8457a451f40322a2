pub mod progress;


pub use progress::{format_duration, human_bytes, status_line, ProgressRenderer, RenderMode};
