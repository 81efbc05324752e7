// YouTube search-and-play front end for the terminal.
//
// Typed queries go through a debouncer to a search provider, results become
// the playback queue, and the chosen track is handed to an external mpv
// process.

pub mod config;
pub mod error;
pub mod logging;
pub mod player;
pub mod session;
pub mod ui;
pub mod youtube;
