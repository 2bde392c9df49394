pub mod app;
pub mod poll;
pub mod sink;
