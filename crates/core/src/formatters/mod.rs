pub mod json;
pub mod markdown;

pub use json::{JsonConfig, JsonOutput, convert_to_json};
pub use markdown::{LinkReference, MarkdownConfig, MarkdownSerializer, convert_to_markdown, generate_frontmatter};
