pub mod thread;

pub use thread::{ThreadedComment, assemble, count_all};
