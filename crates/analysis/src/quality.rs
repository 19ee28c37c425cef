use crate::result::DataQuality;

/// Single scoring function for every analysis branch.
///
/// `present / expected` of 1.0 is high, at least 0.5 is medium, anything
/// less (or nothing expected) is low.
pub fn score(present: usize, expected: usize) -> DataQuality {
    if expected == 0 {
        return DataQuality::Low;
    }

    let ratio = present as f64 / expected as f64;
    if ratio >= 1.0 {
        DataQuality::High
    } else if ratio >= 0.5 {
        DataQuality::Medium
    } else {
        DataQuality::Low
    }
}
