//! Legacy signature generation: command templates, API calls and output formats

mod api_call;
mod output;
mod template;

pub use api_call::{ApiCall, ApiResponse};
pub use output::{apply_output_format, encode_raw_rs};
pub use template::{CommandTemplate, TemplateContext, TemplateError};
