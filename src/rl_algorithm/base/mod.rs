use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use lazy_static::lazy_static;
use tensorboard_rs::summary_writer::SummaryWriter;

pub mod config;
pub mod log_dir;

/// Scalars gathered during one iteration, flushed to tensorboard by `log`.
pub struct EpochLogger {
    log_info: BTreeMap<(String, String), f32>,
    writer: Option<SummaryWriter>,
}

lazy_static! {
    pub static ref EPOCH_LOGGER: Arc<Mutex<EpochLogger>> = Arc::new(Mutex::new(EpochLogger {
        log_info: BTreeMap::new(),
        writer: None,
    }));
}

/// How `add_scalar_agg` folds a value into one already pending for the tag.
pub enum EpochLoggerAggMode {
    Sum,
    Max,
}

fn logger() -> MutexGuard<'static, EpochLogger> {
    EPOCH_LOGGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EpochLogger {
    pub fn init_writer<P: AsRef<Path>>(logdir: P) {
        logger().writer = Some(SummaryWriter::new(logdir));
    }

    pub fn add_scalar(main_tag_sub_tag: (&str, &str), val: f32) {
        let key = (main_tag_sub_tag.0.to_string(), main_tag_sub_tag.1.to_string());
        logger().log_info.insert(key, val);
    }

    pub fn add_scalar_agg(main_tag_sub_tag: (&str, &str), mut val: f32, agg_mod: EpochLoggerAggMode) {
        let mut this = logger();
        let key = (main_tag_sub_tag.0.to_string(), main_tag_sub_tag.1.to_string());
        if let Some(old_val) = this.log_info.get(&key) {
            val = match agg_mod {
                EpochLoggerAggMode::Sum => val + old_val,
                EpochLoggerAggMode::Max => val.max(*old_val),
            }
        }
        this.log_info.insert(key, val);
    }

    /// Emits every pending scalar at `step` and clears them.
    pub fn log(step: usize) {
        let mut this = logger();
        let log_info = std::mem::take(&mut this.log_info);
        log::info!("iteration {}", step);
        for ((main_tag, sub_tag), scalar) in log_info {
            log::info!("  {}/{} = {:.4}", main_tag, sub_tag, scalar);
            if let Some(writer) = this.writer.as_mut() {
                writer.add_scalar(&format!("{}/{}", main_tag, sub_tag), scalar, step);
            }
        }
        if let Some(writer) = this.writer.as_mut() {
            writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(tag: (&str, &str)) -> Option<f32> {
        let key = (tag.0.to_string(), tag.1.to_string());
        logger().log_info.remove(&key)
    }

    #[test]
    fn test_agg_sum_accumulates() {
        let tag = ("Test_Agg", "sum");
        EpochLogger::add_scalar(tag, 1.0);
        EpochLogger::add_scalar_agg(tag, 2.0, EpochLoggerAggMode::Sum);
        EpochLogger::add_scalar_agg(tag, 0.5, EpochLoggerAggMode::Sum);
        assert_eq!(pending(tag), Some(3.5));
    }

    #[test]
    fn test_agg_max_keeps_largest() {
        let tag = ("Test_Agg", "max");
        EpochLogger::add_scalar_agg(tag, -3.0, EpochLoggerAggMode::Max);
        EpochLogger::add_scalar_agg(tag, 4.0, EpochLoggerAggMode::Max);
        EpochLogger::add_scalar_agg(tag, 1.0, EpochLoggerAggMode::Max);
        assert_eq!(pending(tag), Some(4.0));
    }

    #[test]
    fn test_agg_first_value_is_stored_as_is() {
        let tag = ("Test_Agg", "first");
        EpochLogger::add_scalar_agg(tag, -7.0, EpochLoggerAggMode::Sum);
        assert_eq!(pending(tag), Some(-7.0));
        EpochLogger::add_scalar_agg(tag, -7.0, EpochLoggerAggMode::Max);
        assert_eq!(pending(tag), Some(-7.0));
    }
}
