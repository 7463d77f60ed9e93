// Screening: ranking and filtering, evidence highlighting, the end-to-end
// pipeline, and its HTTP handlers.

pub mod handlers;
pub mod highlight;
pub mod pipeline;
pub mod ranking;
