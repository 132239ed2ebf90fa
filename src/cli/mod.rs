pub mod add;
pub mod list;
pub mod refresh;
pub mod remove;
pub mod search;
pub mod setup;
pub mod summary;
pub mod ui;
