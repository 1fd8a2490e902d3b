mod args;
pub mod headless;
mod options;
pub mod seed;
mod setup;

pub use args::{Args, DEFAULT_ROWS};
pub use headless::{run, Headless};
pub use options::RemarkOptions;
pub use setup::setup_logging;
