//! Testing utilities for dataset I/O.
//!
//! This module provides:
//!
//! - **Assertions**: compare read results with what was written, and inspect the files a
//!   write produced
//! - **Fixtures**: ready-made record types, schemas, and populated in-memory datasets
//!
//! # Quick Start
//!
//! ```
//! use ironshard::io::avro::AvroRead;
//! use ironshard::testing::*;
//!
//! # fn main() -> ironshard::DatasetResult<()> {
//! let records = test_records(20);
//! let (fs, _) = memory_dataset("mem://test/out/part", &records, 4)?;
//!
//! let back: Vec<TestRecord> = AvroRead::from("mem://test/out").read(&fs)?;
//! assert_contains_in_any_order(&back, &records);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
