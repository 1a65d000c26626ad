/// Phase definitions for the crawl loop
///
/// The coordinator moves through these phases once per visited page and
/// refuses any transition not listed in [`CrawlPhase::can_transition_to`].
use std::fmt;

/// Represents the current phase of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Waiting to take the next URL from the frontier
    Ready,

    /// Fetching the current URL
    Fetching,

    /// Building a document from the fetched bytes
    Parsing,

    /// Running the item query and extracting records
    Extracting,

    /// Collecting pagination links and offering them to the frontier
    Discovering,

    /// Flushing the full record collection to the sink
    Persisting,

    /// Frontier exhausted, budget spent, or cancelled
    Done,
}

impl CrawlPhase {
    /// Returns true if a transition from `self` to `next` is allowed
    ///
    /// Fetch and parse failures skip straight back to `Ready`. An empty item
    /// query still moves on to `Discovering` so pagination is followed.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        matches!(
            (self, next),
            (Ready, Fetching)
                | (Ready, Done)
                | (Fetching, Parsing)
                | (Fetching, Ready)
                | (Fetching, Done)
                | (Parsing, Extracting)
                | (Parsing, Ready)
                | (Extracting, Discovering)
                | (Discovering, Persisting)
                | (Persisting, Ready)
        )
    }

    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns a short lowercase name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Extracting => "extracting",
            Self::Discovering => "discovering",
            Self::Persisting => "persisting",
            Self::Done => "done",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Ready,
            Self::Fetching,
            Self::Parsing,
            Self::Extracting,
            Self::Discovering,
            Self::Persisting,
            Self::Done,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
