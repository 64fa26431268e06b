use crate::model::{Cents, StayRange};

/// Total for a stay: nights × the room category's nightly rate. Exact
/// integer arithmetic in minor units.
pub fn stay_total(stay: &StayRange, nightly_rate: Cents) -> Cents {
    stay.nights() * nightly_rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    #[test]
    fn two_nights_at_100() {
        assert_eq!(stay_total(&StayRange::new(d(1), d(3)), 100_00), 200_00);
    }

    #[test]
    fn single_night() {
        assert_eq!(stay_total(&StayRange::new(d(1), d(2)), 79_50), 79_50);
    }

    #[test]
    fn long_stay_does_not_round() {
        assert_eq!(stay_total(&StayRange::new(d(1), d(31)), 33), 30 * 33);
    }
}
