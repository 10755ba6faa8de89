//! CPU preview: rasterized shapes and light path, plus the memoizing frame session.

pub(crate) mod cpu;
pub(crate) mod session;
