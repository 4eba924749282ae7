mod responder;
mod small_talk;

pub use responder::{
    DEFAULT_THRESHOLD, FallbackOptions, FallbackResponder, Reply, SimilarAnswer,
};
pub use small_talk::SmallTalk;
