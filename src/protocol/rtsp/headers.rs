/// Standard RTSP header names
pub mod names {
    pub const CSEQ: &str = "CSeq";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const SESSION: &str = "Session";
    pub const TRANSPORT: &str = "Transport";
    pub const USER_AGENT: &str = "User-Agent";
    pub const PUBLIC: &str = "Public";
    pub const SERVER: &str = "Server";
}

/// Headers only RAOP peers send or expect
pub mod raop {
    /// Output latency reported on RECORD
    pub const AUDIO_LATENCY: &str = "Audio-Latency";
    /// Jack status on SETUP
    pub const AUDIO_JACK_STATUS: &str = "Audio-Jack-Status";
    /// Jack status on OPTIONS
    pub const APPLE_JACK_STATUS: &str = "Apple-Jack-Status";
}

/// Ordered header list
///
/// Lookup is case-sensitive on the name as received. A repeated name
/// overwrites the earlier value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Empty header list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Value stored under exactly `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// Whether `name` is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Raw `CSeq` value, echoed verbatim in responses
    #[must_use]
    pub fn cseq(&self) -> Option<&str> {
        self.get(names::CSEQ)
    }

    /// Declared body length
    ///
    /// Missing, negative or non-numeric values read as zero.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.get(names::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// Body media type
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get(names::CONTENT_TYPE)
    }

    /// Session id
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.get(names::SESSION)
    }

    /// Name/value pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of distinct names
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
