#![forbid(unsafe_code)]

pub mod graph;
pub mod model;
pub mod next_up;
pub mod practice;
pub mod selection;
pub mod time;
pub mod visibility;

pub use graph::TopicGraph;
pub use time::Clock;
