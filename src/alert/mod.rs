/// Alert decisions and alert text.
///
/// - `precipitation` - threshold check and snooze tier selection
/// - `messages`      - subject/body for rain alerts and resume notices

pub mod messages;
pub mod precipitation;

pub use precipitation::{evaluate, Evaluation};
