//! # Lantern
//!
//! Usage and dependency analysis for BI report layout documents.
//!
//! A report layout is one deeply nested JSON document, with several
//! sub-documents JSON-encoded as strings inside it. Lantern decodes that
//! surface, discovers every field each visual and filter references,
//! normalizes those references against the report's measure definitions,
//! and resolves which measures are used, directly or transitively, and
//! which are dead weight.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        Layout document (JSON-in-JSON strings)         │
//! └──────────────────────────────────────────────────────┘
//!                        │
//!                        ▼ [layout]
//! ┌──────────────────────────────────────────────────────┐
//! │       Typed records (sections, visuals, measures)     │
//! └──────────────────────────────────────────────────────┘
//!                        │
//!                        ▼ [extract + model]
//! ┌──────────────────────────────────────────────────────┐
//! │   Report model: pages, visuals, measures, usage graph │
//! └──────────────────────────────────────────────────────┘
//!                        │
//!                        ▼ [export]
//! ┌──────────────────────────────────────────────────────┐
//! │         Flat measure / page records (serde)           │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Construction is synchronous and performs no I/O; callers hand in an
//! already-decoded tree. Reports are independent of one another, so a
//! batch of layouts can be parsed in parallel by the caller.

pub mod export;
pub mod extract;
pub mod layout;
pub mod model;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::export::{measure_records, page_records, MeasureRecord, PageRecord};
    pub use crate::extract::{find_field_refs, strip_wrapper_functions};
    pub use crate::layout::{LayoutDocument, LayoutError, LayoutResult};
    pub use crate::model::{
        Diagnostic, DuplicatePolicy, Measure, MeasureSummary, Page, Report, ReportOptions,
        UsageState, Visual,
    };
}

pub use layout::{LayoutDocument, LayoutError, LayoutResult};
pub use model::{Diagnostic, Measure, Page, Report, UsageState, Visual};
