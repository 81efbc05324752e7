pub mod backend;
pub mod debounce;
pub mod mpv;
pub mod queue;
