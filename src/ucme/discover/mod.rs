pub mod listener;
pub mod notifier;
pub mod session;
pub mod types;

pub use listener::{DiscoverListener, EmptyDiscoverListener};
pub use notifier::MatchNotifier;
pub use session::SwipeSession;
pub use types::{Candidate, MatchEvent, SwipeDecision, SwipeDirection, SwipeSessionState};
