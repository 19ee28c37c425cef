pub mod benchmark;
pub mod test_set;

pub use benchmark::{BenchmarkResults, Benchmarker, LatencyStats, TypeAccuracy};
pub use test_set::{LabelledQuery, get_test_set};
