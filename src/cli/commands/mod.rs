//! CLI command implementations.

mod add;
mod config;
mod doctor;
mod list;
mod lyrics;
mod remove;
mod serve;
mod show;

pub use add::{run_add, AddArgs};
pub use config::run_config;
pub use doctor::run_doctor;
pub use list::run_list;
pub use lyrics::run_lyrics;
pub use remove::run_remove;
pub use serve::run_serve;
pub use show::run_show;
