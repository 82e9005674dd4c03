//! Internal helpers shared by the copy engine.

pub(crate) mod path;
