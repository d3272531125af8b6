pub mod benchmark;
pub mod compressor;
pub mod cost;
pub mod error;
pub mod group;
pub mod pareto;
pub mod report;
pub mod results;
pub mod runner;
