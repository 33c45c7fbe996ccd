//! Error taxonomy for the tracking engine.
//!
//! Only a parse failure of the root file is a hard error. Unresolvable
//! imports, unreadable files, and ambiguous member access are absorbed
//! during analysis and truncate the affected flow path instead.

use crate::parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}
