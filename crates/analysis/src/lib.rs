pub mod analyzer;
pub mod quality;
pub mod result;

pub use analyzer::{AnalysisError, Analyzer};
pub use quality::score;
pub use result::{
    AnalysisDetails, AnalysisResult, BasicInfo, DataQuality, ErrorKind, FinancialOverview,
    SupplierEntry,
};
