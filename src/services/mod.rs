pub mod ai;
pub mod assistant;
pub mod booking_sink;
pub mod composer;
pub mod dedup;
pub mod dialogue;
pub mod fast_extractor;
pub mod messaging;
pub mod normalizer;
pub mod reconciler;
pub mod session_store;
