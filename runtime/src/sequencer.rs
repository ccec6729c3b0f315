use cartogram_shared::Timestamp;
use tracing::debug;

/// Tracks outstanding frame requests so that only the newest one wins.
///
/// Keys are canonical timestamp strings, appended in request order. A result
/// is accepted only while its key is still outstanding; accepting it retires
/// every key requested up to and including it.
#[derive(Debug, Default)]
pub struct FrameSequencer {
    outstanding: Vec<String>,
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. Call before issuing the fetch.
    pub fn begin(&mut self, timestamp: &Timestamp) {
        self.outstanding.push(timestamp.canonical());
    }

    /// Returns `true` if a frame resolved for `timestamp` should be applied.
    pub fn accept(&mut self, timestamp: &Timestamp) -> bool {
        let key = timestamp.canonical();
        match self.outstanding.iter().position(|k| *k == key) {
            Some(index) => {
                self.outstanding.drain(..=index);
                true
            }
            None => {
                debug!(timestamp = %key, "discarding superseded frame");
                false
            }
        }
    }

    /// A fetch for `timestamp` failed: forget that one request only.
    pub fn fail(&mut self, timestamp: &Timestamp) {
        let key = timestamp.canonical();
        if let Some(index) = self.outstanding.iter().position(|k| *k == key) {
            self.outstanding.remove(index);
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}

#[cfg(test)]
mod tests {
    use cartogram_shared::Timestamp;

    use super::FrameSequencer;

    fn ts(year: i32) -> Timestamp {
        Timestamp::year(year).expect("valid year")
    }

    #[test]
    fn later_request_supersedes_earlier_resolution() {
        let mut seq = FrameSequencer::new();
        seq.begin(&ts(2000));
        seq.begin(&ts(2001));

        assert!(seq.accept(&ts(2001)));
        assert!(!seq.accept(&ts(2000)));
        assert_eq!(seq.outstanding(), 0);
    }

    #[test]
    fn in_order_resolution_applies_both() {
        let mut seq = FrameSequencer::new();
        seq.begin(&ts(2000));
        seq.begin(&ts(2001));

        assert!(seq.accept(&ts(2000)));
        assert_eq!(seq.outstanding(), 1);
        assert!(seq.accept(&ts(2001)));
    }

    #[test]
    fn every_permutation_applies_only_the_last_request_once() {
        let requested = [ts(2000), ts(2001), ts(2002), ts(2003)];
        let orders: [[usize; 4]; 6] = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [1, 3, 0, 2],
            [2, 0, 3, 1],
            [3, 0, 1, 2],
            [0, 2, 3, 1],
        ];

        for order in orders {
            let mut seq = FrameSequencer::new();
            for t in &requested {
                seq.begin(t);
            }
            let last_accepted = order
                .iter()
                .filter(|&&i| seq.accept(&requested[i]))
                .last()
                .copied();
            assert_eq!(last_accepted, Some(3), "order {order:?}");
            assert!(!seq.accept(&requested[3]), "order {order:?} applied twice");
        }
    }

    #[test]
    fn repeated_timestamp_retires_the_oldest_copy_first() {
        let mut seq = FrameSequencer::new();
        seq.begin(&ts(2000));
        seq.begin(&ts(2001));
        seq.begin(&ts(2000));

        assert!(seq.accept(&ts(2000)));
        assert_eq!(seq.outstanding(), 2);
        assert!(seq.accept(&ts(2000)));
        assert_eq!(seq.outstanding(), 0);
        assert!(!seq.accept(&ts(2001)));
    }

    #[test]
    fn failure_removes_only_its_own_key() {
        let mut seq = FrameSequencer::new();
        seq.begin(&ts(2000));
        seq.begin(&ts(2001));
        seq.begin(&ts(2002));

        seq.fail(&ts(2001));
        assert_eq!(seq.outstanding(), 2);
        assert!(seq.accept(&ts(2000)));
        assert!(seq.accept(&ts(2002)));
        seq.fail(&ts(1999));
        assert_eq!(seq.outstanding(), 0);
    }
}
