// Candidate profiles and the interviewer dashboard.

pub mod aggregator;
pub mod handlers;
pub mod store;
