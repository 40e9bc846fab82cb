use serde::{Deserialize, Serialize};

/// Community rating as reported by an external catalog: an average value
/// on a 0–5 scale plus the number of votes behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunityRating {
    pub value: Rating,
    pub votes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rating(u32);

impl Rating {
    const SCALE_FACTOR: u32 = 10000;
    const MAX_VALUE: u32 = 5 * Self::SCALE_FACTOR;

    pub fn new(value: f32) -> Option<Self> {
        if !(0.0..=5.0).contains(&value) {
            return None;
        }

        let scaled_value = (value * Self::SCALE_FACTOR as f32).round() as u32;

        if scaled_value > Self::MAX_VALUE {
            return None;
        }

        Some(Self(scaled_value))
    }

    pub fn as_f32(&self) -> f32 {
        self.0 as f32 / Self::SCALE_FACTOR as f32
    }
}
