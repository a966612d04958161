use crate::model::sample::LatLng;

/// Number of positions kept per user; enough for one trailing segment.
pub const TRAIL_CAPACITY: usize = 2;

/// Sliding window over a user's most recent positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserTrail {
    points: Vec<LatLng>,
}

impl UserTrail {
    /// Appends a position and returns the segment from the previous one, if any.
    pub fn push(&mut self, position: LatLng) -> Option<[LatLng; 2]> {
        if self.points.len() == TRAIL_CAPACITY {
            self.points.remove(0);
        }
        self.points.push(position);
        match self.points.as_slice() {
            [previous, current] => Some([*previous, *current]),
            _ => None,
        }
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<LatLng> {
        self.points.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_push_yields_no_segment() {
        let mut trail = UserTrail::default();
        assert!(trail.push(LatLng::new(1.0, 1.0)).is_none());
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn trail_never_exceeds_capacity() {
        let mut trail = UserTrail::default();
        for step in 0..10 {
            trail.push(LatLng::new(step as f64, 0.0));
            assert!(trail.len() <= TRAIL_CAPACITY);
        }
        assert_eq!(
            trail.points(),
            &[LatLng::new(8.0, 0.0), LatLng::new(9.0, 0.0)]
        );
    }

    #[test]
    fn segment_connects_previous_and_current() {
        let mut trail = UserTrail::default();
        trail.push(LatLng::new(1.0, 1.0));
        let segment = trail.push(LatLng::new(2.0, 2.0)).unwrap();
        assert_eq!(segment, [LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]);
        assert_eq!(trail.latest(), Some(LatLng::new(2.0, 2.0)));
    }
}
