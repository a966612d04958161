use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of a dated detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateQuery {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateQuery {
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impossible_dates_are_rejected() {
        let query = DateQuery {
            year: 2017,
            month: 2,
            day: 30,
        };
        assert!(query.to_date().is_none());
    }
}
