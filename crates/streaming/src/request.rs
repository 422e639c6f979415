use foundation::ids::Epoch;

/// Stamp carried by every dispatched fetch.
///
/// `epoch` ties the fetch to one view selection; `seq` orders fetches that
/// target the same slot so a slow earlier response never overwrites a faster
/// later one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket {
    pub epoch: Epoch,
    pub seq: u64,
}

impl FetchTicket {
    pub const fn new(epoch: Epoch, seq: u64) -> Self {
        Self { epoch, seq }
    }

    /// Whether a completion carrying `self` may replace a slot last written by
    /// `applied` while `current` is the live epoch.
    pub fn supersedes(&self, current: Epoch, applied: Option<u64>) -> bool {
        self.epoch == current && applied.is_none_or(|seq| self.seq > seq)
    }
}
