//! # formprune
//!
//! Structural cleanup of form submissions.
//!
//! A form definition is a tree of components. Some components are input
//! fields, some are containers holding nested components, and some are
//! repeating containers (data grids) whose submitted value is a list of
//! rows. `formprune` infers an allowed-shape schema from that tree and
//! prunes submitted data down to the fields the form actually declares.
//!
//! ## Quick Start
//!
//! ```rust
//! use formprune::{derive_schema, prune_data};
//! use serde_json::json;
//!
//! let form = json!({
//!     "components": [
//!         { "type": "textfield", "key": "name", "input": true },
//!         {
//!             "type": "datagrid", "key": "rows", "tree": true,
//!             "components": [{ "type": "textfield", "key": "city", "input": true }]
//!         }
//!     ]
//! });
//!
//! let schema = derive_schema(&form);
//! assert_eq!(schema, json!({ "name": true, "rows": [{ "city": true }] }));
//!
//! let data = json!({ "name": "a", "extra": 1, "rows": [{ "city": "X", "junk": 1 }] });
//! assert_eq!(
//!     prune_data(&data, &schema),
//!     json!({ "name": "a", "rows": [{ "city": "X" }] })
//! );
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Helpers over `serde_json::Value`
//! - [`schema`] - Shape schema inference from form definitions
//! - [`prune`] - Submission data pruning
//! - [`submission`] - Whole-submission cleanup
//! - [`fields`] - Form variable name listing
//! - [`grid`] - Row wrapping for single-column grids

#[macro_use]
extern crate log;

/// Shape schema inference from form definitions.
pub mod schema;

/// Pruning of submitted data against a shape schema.
pub mod prune;

/// Whole-submission cleanup built from [`schema`] and [`prune`].
pub mod submission;

/// Form variable name listing.
pub mod fields;

/// Helpers over `serde_json::Value`.
pub mod value;

pub mod grid;

pub use fields::variable_names;
pub use grid::{unwrap_grid_data, unwrap_grid_data_with, wrap_grid_data, wrap_grid_data_with};
pub use prune::{prune, prune_data};
pub use schema::{SchemaBuilder, derive_schema};
pub use serde_json::Value;
pub use submission::{
    clean_submission, clean_submission_with, should_process_submission, wrap_submission,
};
