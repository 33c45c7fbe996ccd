//! CLI command implementations

pub mod init;
pub mod track;

pub use init::InitArgs;
pub use track::TrackArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track marked bindings in a file or directory
    Track(TrackArgs),

    /// Initialize fieldtrace configuration in the current directory
    Init(InitArgs),
}
