//! Repository modules implementing storage operations for all SkillTrack entities.
//!
//! Each module adds methods to `SktService` via `impl SktService` blocks.

pub mod audit;
pub mod beneficiary;
pub mod evidence;
pub mod export;
pub mod funding_rule;
pub mod impact;
pub mod import;
pub mod placement;
pub mod programme;
pub mod progress;
pub mod target;
