pub mod capture;
pub mod context;
pub mod executor;
pub mod fault;
pub mod output;
pub mod result;
