pub mod config;
pub mod dom_tree;
pub mod error;
pub mod extract;
pub mod formatters;
pub mod metadata;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod result;
pub mod scoring;
pub mod url_utils;

pub use config::{ExtractConfig, ExtractConfigBuilder, ParseLimits};
#[doc(hidden)]
pub use dom_tree::{DomNode, ElementData, NodeData};
pub use dom_tree::{DomTree, ElementKind, Guard, GuardTrip, NodeId};
pub use error::{ReadmarkError, Result};
pub use extract::{Extractor, extract, extract_with_config, is_probably_readable};
pub use formatters::{JsonConfig, MarkdownConfig, convert_to_json, convert_to_markdown, generate_frontmatter};
pub use metadata::{TitleConfig, resolve_title};
pub use postprocess::{PruneConfig, prune_low_value};
pub use preprocess::strip_structural;
pub use result::{Extraction, ExtractionResult, OutputFormat};
#[doc(hidden)]
pub use scoring::{TextStats, base_tag_score, calculate_score, class_id_weight, text_stats};
pub use scoring::{ScoreConfig, Selection, TagWeights, select_main_content};
