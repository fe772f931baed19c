use log::debug;

/// Strip whitespace and trailing slashes so `http://a:1/` and `http://a:1` compare equal.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Known peers in registration order. Never holds self or duplicates.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    self_url: String,
    peers: Vec<String>,
}

impl PeerRegistry {
    pub fn new(self_url: &str) -> Self {
        Self {
            self_url: normalize_url(self_url),
            peers: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, url: &str) -> bool {
        let url = normalize_url(url);
        self.peers.iter().any(|p| *p == url)
    }

    /// Add `url` unless it is empty, self, or already known. Returns whether it was added.
    pub fn register(&mut self, url: &str) -> bool {
        let url = normalize_url(url);
        if url.is_empty() || url == self.self_url || self.peers.contains(&url) {
            debug!("PEERS - skipping {:?}", url);
            return false;
        }
        debug!("PEERS - registered {}", url);
        self.peers.push(url);
        true
    }

    /// Register each url in order; returns how many were new.
    pub fn register_bulk<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for url in urls {
            if self.register(url.as_ref()) {
                added += 1;
            }
        }
        added
    }

    pub fn list(&self) -> Vec<String> {
        self.peers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELF_URL: &str = "http://localhost:3001";

    #[test]
    fn ignores_self_and_duplicates() {
        let mut reg = PeerRegistry::new(SELF_URL);
        assert!(reg.register("http://localhost:3002"));
        assert!(!reg.register("http://localhost:3002"));
        assert!(!reg.register(SELF_URL));
        assert!(!reg.register("http://localhost:3001/"));
        assert!(!reg.register("   "));
        assert_eq!(reg.list(), vec!["http://localhost:3002"]);
    }

    #[test]
    fn bulk_keeps_first_seen_order() {
        let mut reg = PeerRegistry::new(SELF_URL);
        reg.register("http://localhost:3003");
        let added = reg.register_bulk(&[
            "http://localhost:3004",
            SELF_URL,
            "http://localhost:3003",
            "http://localhost:3002",
            "http://localhost:3004/",
        ]);
        assert_eq!(added, 2);
        assert_eq!(
            reg.list(),
            vec![
                "http://localhost:3003",
                "http://localhost:3004",
                "http://localhost:3002"
            ]
        );
    }

    #[test]
    fn repeated_overlapping_calls_stay_clean() {
        let mut reg = PeerRegistry::new(SELF_URL);
        let batch = ["http://a:1", "http://b:2", SELF_URL];
        for _ in 0..3 {
            reg.register_bulk(&batch);
            reg.register("http://b:2");
            reg.register(SELF_URL);
        }
        let list = reg.list();
        assert_eq!(list, vec!["http://a:1", "http://b:2"]);
        assert!(!reg.contains(SELF_URL));
    }
}
