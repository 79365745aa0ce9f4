//! Report rendering.

pub mod generator;

pub use generator::{
    format_metric, format_number, format_percentage, format_thousands, generate_json_report,
    generate_markdown_report, write_report,
};
