pub mod add;
pub mod common;
pub mod completions;
pub mod dashboard;
pub mod delete;
pub mod edit;
pub mod list;
pub mod sync;
pub mod track;
