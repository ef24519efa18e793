//! # API Route Modules
//!
//! - `requirements`: paginated header search, single header, details.
//! - `imports`: spreadsheet uploads for headers and details.
//! - `exports`: markdown export, single and batch, plus rendered content.

pub mod exports;
pub mod imports;
pub mod requirements;
