pub mod basic;
pub mod middleware;
