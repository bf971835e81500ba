//! Prompt assembly for continuation turns.
//!
//! | Part | Source | Trim strategy |
//! |------|--------|---------------|
//! | System | Fixed onboarding prompt | Never trimmed |
//! | History | Profile conversation | First 3 kept, then most recent; middle dropped |

pub mod assembler;
pub mod token;

pub use assembler::{PromptAssembler, TurnPlan};
