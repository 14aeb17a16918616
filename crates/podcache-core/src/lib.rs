pub mod clock;
pub mod error;
pub mod model;
pub mod query;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{QueryError, SourceError};
pub use model::{InventoryItem, Snapshot};
pub use query::{Page, PageRequest, SearchQuery, SearchResult, paginate, search};
pub use source::{InventorySource, StaticInventorySource};
