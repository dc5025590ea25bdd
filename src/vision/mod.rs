// Screen recognition: template store, matcher and the wait-for-any poller.
// The matcher is a pure function of (screenshot bytes, template cache);
// all blocking lives in `waiter`.

pub mod error;
pub mod matcher;
pub mod store;
pub mod waiter;

#[cfg(test)]
mod tests;

pub use error::MatchError;
pub use matcher::{MatchResult, Point, TemplateMatcher, DEFAULT_THRESHOLD};
pub use store::TemplateStore;
pub use waiter::wait_for_any;
