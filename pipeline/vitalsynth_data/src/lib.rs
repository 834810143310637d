//! Tabular boundary of the synthesis pipeline.
//!
//! - `reader`: real long-format cohort (`user_id,time,glucose,heart_rate,steps`)
//!   and the wide synthetic glucose matrix (`t_0 .. t_N`)
//! - `writer`: whole-file atomic dataset output
//! - `store`: read-only per-user column access over a written dataset
//!
//! Reading a dataset back:
//! ```ignore
//! use vitalsynth_data::{Column, TimeSeriesStore};
//! let store = TimeSeriesStore::open("synthetic/enhanced.csv".as_ref())?.with_id_limit(201);
//! let frame = store.load_columns(12, &[Column::Glucose, Column::HeartRate])?;
//! println!("{} slots", frame.len());
//! ```
pub mod error;
pub mod reader;
pub mod record;
pub mod store;
pub mod writer;

pub type UserId = u32;

pub use error::DataError;
pub use reader::{parse_glucose_matrix, parse_real_cohort, read_glucose_matrix, read_real_cohort};
pub use record::{format_time, parse_time, GlucoseMatrix, RawSample, RawSeries, SyntheticRow, TIME_FORMAT};
pub use store::{Column, TimeSeriesStore, UserFrame};
pub use writer::write_dataset_atomic;
