//! The onboarding agent — turns one inbound text into one reply.
//!
//! Every turn follows the same path:
//!
//! 1. **Record** the inbound message on the user's profile
//! 2. **Plan**: the first message ever gets the fixed welcome script
//! 3. **Assemble** the system prompt plus bounded history otherwise
//! 4. **Complete** via the configured provider, falling back to an apology on failure
//! 5. **Record** the reply and return it

pub mod context;
pub mod prompts;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{PromptAssembler, TurnPlan};
pub use prompts::{FALLBACK_REPLY, SYSTEM_PROMPT, WELCOME_SCRIPT};
pub use turn::TurnProcessor;
