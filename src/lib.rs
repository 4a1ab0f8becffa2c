// src/lib.rs — Library root for devicefix

pub mod api;
pub mod entitlement;
pub mod infra;
pub mod pipeline;
pub mod provider;
pub mod storage;
pub mod util;
