//! Terminal front end.
//!
//! - [`display`]: success messages and the algorithm listing
//! - [`progress`]: progress bar fed by the engine
//! - [`prompt`]: password prompts

pub mod display;
pub mod progress;
pub mod prompt;
