mod attempt;
mod feedback;
mod ids;
mod question;
mod role;
mod scale;
mod selection;
mod topic;
mod topics_state;

pub use ids::{AttemptId, ChoiceId, ParseIdError, QuestionId, TopicId};
pub use role::{ParseRoleError, Role};
pub use scale::{Band, Difficulty, ScaleError};

pub use attempt::{AnswerPayload, Attempt, AttemptError, AttemptStatus};
pub use feedback::{
    Confidence, Feedback, FeedbackDraft, FeedbackError, RubricCategory, RubricScore,
};
pub use question::{Choice, Question, QuestionError, QuestionFormat, Sequence, SequenceStep};
pub use selection::{IncludeChildren, SelectionEntry, SelectionMap, SelectionState};
pub use topic::{TopicError, TopicMetrics, TopicNode, Trend};
pub use topics_state::{
    RoleSetError, RoleTopics, TopicsState, TopicsStateError, custom_topic_id,
};
