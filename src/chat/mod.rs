//! Chat lanes: modes, histories, session state and the turn engine

pub mod engine;
pub mod history;
pub mod mode;
pub mod session;

pub use engine::{ChatEngine, Comparison, TurnOutcome};
pub use history::{ChatHistory, Speaker, Turn};
pub use mode::{ChatMode, LaneKey, ModelProfile};
pub use session::{Lane, SessionManager};
