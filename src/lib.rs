pub mod capture;
pub mod console;
pub mod error;
pub mod filter;
pub mod packet;
pub mod pipeline;
pub mod stats;
