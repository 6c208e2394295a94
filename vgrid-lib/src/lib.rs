//! Windowed data grid engine
//!
//! Displays very large, server-side paginated data sets by only fetching and
//! rendering the rows inside the viewport plus a buffer. Scroll events are
//! debounced, each fetch carries a monotonic token so out-of-order responses
//! cannot corrupt the cache, and the cache can be invalidated after sort,
//! search or data changes.
//!
//! The main entry point is [`VirtualGrid`]; rows come from any
//! [`DataSource`](source::DataSource) implementation.

pub mod cache;
pub mod column;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod grid;
pub mod model;
pub mod range;
pub mod source;
pub mod view;

pub use config::GridConfig;
pub use coordinator::FetchOutcome;
pub use coordinator::RequestCoordinator;
pub use coordinator::RequestToken;
pub use error::ConfigError;
pub use error::GridError;
pub use error::SourceError;
pub use grid::GridEvent;
pub use grid::GridSnapshot;
pub use grid::LoadKind;
pub use grid::Phase;
pub use grid::RowSlot;
pub use grid::VirtualGrid;
pub use range::VisibleRange;
pub use view::RenderedRow;
pub use view::TableView;
