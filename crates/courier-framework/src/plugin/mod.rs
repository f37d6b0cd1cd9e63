//! Plugin commands backed by declarative request templates.
//!
//! - [`template`]: the template document model
//! - [`render`]: `{{...}}` interpolation
//! - [`executor`]: input coercion, the outbound call and response mapping

pub mod executor;
pub mod render;
pub mod template;

pub use executor::{PluginOutput, build_request, execute, format_input, resolve_template};
pub use render::{interpolate, interpolate_url};
pub use template::{
    BodySpec, BodyType, InputSpec, InputType, OutputMapping, OutputType, RequestTemplate,
    ResponseInput, ResponseSpec,
};
