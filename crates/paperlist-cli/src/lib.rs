//! Library half of the `paperlist` command: input loading, terminal tables,
//! and logging setup.

pub mod input;
pub mod logging;
pub mod table;
