//! Period consolidation: the atomic, irreversible close of a month.

pub mod engine;

pub use engine::PeriodConsolidationEngine;
