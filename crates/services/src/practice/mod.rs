mod grader;
mod picker;
mod records;
mod session;
mod workflow;

pub use crate::error::PracticeError;
pub use grader::{Grader, MockGrader};
pub use picker::{PickHint, QuestionPicker};
pub use records::{BookmarkService, HistoryItem, HistoryService};
pub use session::PracticeSession;
pub use workflow::{NextUpOutcome, PracticeLoopService};
