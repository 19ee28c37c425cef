pub mod bundle;
pub mod resolver;
pub mod retriever;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bundle::{Content, Dataset, DatasetBundle};
pub use resolver::{EntityResolver, ResolveError};
pub use retriever::{DatasetRetriever, RetrieveError, Retrieval};
