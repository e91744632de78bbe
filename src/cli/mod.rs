pub mod check;
pub mod list;
pub mod output;
pub mod run;

pub use check::cmd_check;
pub use list::cmd_list;
pub use output::OutputFormat;
pub use run::{cmd_run, RunArgs};
