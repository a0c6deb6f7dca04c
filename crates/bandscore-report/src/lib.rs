//! bandscore-report - Self-contained HTML reports.

pub mod html;

pub use html::{generate_batch_html, generate_evaluation_html, write_html};
