pub mod etl;
pub mod mapreduce;
pub mod pipeline_sequence;
pub mod shuffle;
pub mod stage_io;

pub use crate::domain::model::{StageCounters, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Mapper, OutputRecord, Reducer, Storage};
pub use crate::utils::error::Result;
