//! Dialogue planning
//!
//! [`DialoguePlanner`] maps (history, latest observation) to the next
//! [`AgentAction`]. Configuration ([`PlannerConfig`]) is validated once and
//! never changes; everything that changes per turn lives in [`PlannerState`].
//!
//! ```text
//!   plan([], _)            -> greeting
//!   plan(history, obs)     -> classify(normalize(obs)); count += 1
//!       count >= max       -> farewell (ACTIVE -> TERMINATED, absorbing)
//!       otherwise          -> memory.respond(obs)
//! ```

mod action;
mod config;
mod normalize;
mod planner;
mod state;

pub use action::{ASK_FOR_INPUT_TOOL, AgentAction, Turn};
pub use config::{ConfigError, PlannerConfig};
pub use normalize::{
    CaptioningNormalizer, DEFAULT_DELIMITER, DelimiterJoin, ObservationNormalizer, Passthrough, normalizer_for,
};
pub use planner::{DialoguePlanner, PlannerError};
pub use state::{DEFAULT_TOXICITY, PlannerPhase, PlannerState, UNKNOWN_EMOTION};
