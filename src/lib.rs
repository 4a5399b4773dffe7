pub mod acquire;
pub mod archive;
pub mod checksum;
pub mod config;
pub mod dataset;
pub mod datasets;
pub mod error;
pub mod fetch;
pub mod fs_util;
pub mod index;
pub mod output;
pub mod registry;

pub use acquire::{AcquireOptions, AcquiredDataset, default_datasets_root};
pub use dataset::{Dataset, DatasetDescriptor, DatasetInfo, RemoteSource};
pub use error::ResolvError;
pub use fetch::{FetchRequest, HttpFetcher, SourceFetcher};
pub use index::{DatasetEntry, DatasetIndex, EntryFile};
pub use registry::import_dataset;
