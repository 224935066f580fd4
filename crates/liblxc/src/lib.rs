//! Restarting of checkpointed LXC containers
//! The restart flow lives in [`restart`]; configuration parsing and the
//! restore engines it drives are in [`config`] and [`engine`].
pub mod config;
pub mod engine;
pub mod restart;
