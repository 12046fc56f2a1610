pub mod api;
pub mod clause;
pub mod collapse;
pub mod compound;
pub mod config;
pub mod context;
pub mod element;
pub mod error;
pub mod expression;
pub mod keywords;
pub mod lexer;
pub mod mode;
pub mod report;
pub mod statement;
pub mod string_utils;
pub mod token;

// Re-export the main public API
pub use api::{format, format_script, format_string, get_matching_paths, run, split_statements};
pub use config::load_config;
pub use error::SqlalignError;
pub use mode::{FormatMode, Mode};
