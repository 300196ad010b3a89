/// Monotonic tag attached to an issued fetch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchSeq(pub u64);

impl std::fmt::Display for FetchSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The result belongs to the latest issued fetch and may be applied.
    Current,
    /// A newer fetch was issued (or the sequence was invalidated) since.
    Stale,
}

/// Last-issued-wins guard for one fetch kind.
///
/// Results are accepted only for the most recently issued sequence, and only
/// once; any completion for an older sequence is stale regardless of the
/// order in which completions arrive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SequenceGuard {
    next: u64,
    latest: Option<FetchSeq>,
    completed: Option<FetchSeq>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> FetchSeq {
        let seq = FetchSeq(self.next);
        self.next = self.next.wrapping_add(1);
        self.latest = Some(seq);
        seq
    }

    pub fn latest(&self) -> Option<FetchSeq> {
        self.latest
    }

    /// Whether a fetch is issued and its completion has not been seen yet.
    pub fn in_flight(&self) -> bool {
        self.latest.is_some() && self.latest != self.completed
    }

    pub fn is_latest(&self, seq: FetchSeq) -> bool {
        self.latest == Some(seq)
    }

    /// Classifies a completion and records it when current.
    pub fn complete(&mut self, seq: FetchSeq) -> Verdict {
        if !self.is_latest(seq) || self.completed == Some(seq) {
            return Verdict::Stale;
        }
        self.completed = Some(seq);
        Verdict::Current
    }

    /// Turns every outstanding fetch stale.
    pub fn invalidate(&mut self) {
        self.latest = None;
    }
}
