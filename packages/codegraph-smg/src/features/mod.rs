//! Feature modules

pub mod smg;
