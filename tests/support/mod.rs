#![allow(dead_code)]

pub mod architecture;
pub mod fleet;
pub mod http;
