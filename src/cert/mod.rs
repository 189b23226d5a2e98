//! Certification scoring and the Bronze/Silver/Gold state machine.
//!
//! A published skill earns a certification level by passing every weighted
//! criterion at that level and all levels below it. Auto-checkable criteria
//! read live marketplace signals; the rest go through an administrative
//! review workflow. Levels only ever move forward.

pub mod criteria;
pub mod engine;
pub mod level;
pub mod request;
pub mod signals;

pub use criteria::{default_criteria, Criterion, CriterionCheck, CriterionOutcome, CriterionResult};
pub use engine::{CertificationEngine, CertificationStatus};
pub use level::CertLevel;
pub use request::{CertificationRequest, RequestStatus};
pub use signals::QualitySignals;
