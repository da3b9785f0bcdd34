use std::fmt::Display;

/// Logs statistics under a name prefix through the [`log`] facade.
#[derive(Debug, Default)]
pub struct StatisticLogger {
    /// The prefix which will be attached to the statistic name
    name_prefix: String,
}

impl StatisticLogger {
    pub fn new(name_prefix: impl Display) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
        }
    }

    /// Logs the statistic with the provided `name` and `value`.
    pub fn log_statistic(&self, name: impl Display, value: impl Display) {
        log::info!(
            target: "sorrel::statistics",
            "{}{name}={value}",
            self.name_prefix
        );
    }
}
