pub mod error;
pub mod filter;
pub mod report;
pub mod runner;
pub mod session;
pub mod testcase;
pub mod util;
