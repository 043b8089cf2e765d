/// Edge trigger over per-datagram match results.
///
/// Senders repeat the magic packet several times; only the first match of a
/// run fires. A non-matching datagram re-arms the detector.
#[derive(Debug, Default)]
pub struct WakeDetector {
    last_matched: bool,
}

impl WakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one result and returns `true` if it starts a new run.
    pub fn observe(&mut self, matched: bool) -> bool {
        let fire = matched && !self.last_matched;
        self.last_matched = matched;
        fire
    }

    pub fn is_triggered(&self) -> bool {
        self.last_matched
    }
}
