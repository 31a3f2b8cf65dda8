//! Partition identity: one category on one date

use crate::domain::category::Category;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::PathBuf;

/// Unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    /// Data category
    pub category: Category,
    /// Calendar date (UTC)
    pub date: NaiveDate,
}

impl Partition {
    /// Creates a new partition
    pub fn new(category: Category, date: NaiveDate) -> Self {
        Self { category, date }
    }

    /// Relative directory of this partition: `{category}/{YYYY}/{MM}/{DD}`
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.category.as_str())
            .join(format!("{:04}", self.date.year()))
            .join(format!("{:02}", self.date.month()))
            .join(format!("{:02}", self.date.day()))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:04}/{:02}/{:02}",
            self.category,
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_display_and_dir() {
        let partition = Partition::new(
            Category::Generation,
            NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
        );
        assert_eq!(partition.to_string(), "generation/2026/01/07");
        assert_eq!(
            partition.relative_dir(),
            PathBuf::from("generation").join("2026").join("01").join("07")
        );
    }
}
