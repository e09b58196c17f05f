/// Named processors in signal order.
///
/// Order is explicit: a new name is appended, an existing name is
/// replaced where it already sits.
#[derive(Clone, Debug)]
pub struct ProcessorChain<N> {
    entries: Vec<(String, N)>,
}

impl<N> Default for ProcessorChain<N> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<N> ProcessorChain<N> {
    /// Inserts `node` under `name` and returns the node it replaced.
    pub fn insert(&mut self, name: &str, node: N) -> Option<N> {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            return Some(std::mem::replace(&mut slot.1, node));
        }
        self.entries.push((name.to_string(), node));
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<N> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&N> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.entries.iter().map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readding_a_name_keeps_its_position() {
        let mut chain = ProcessorChain::default();
        chain.insert("gain", 1);
        chain.insert("panner", 2);
        chain.insert("analysis", 3);

        assert_eq!(chain.insert("panner", 20), Some(2));
        assert_eq!(chain.names(), vec!["gain", "panner", "analysis"]);
        assert_eq!(chain.get("panner"), Some(&20));
    }

    #[test]
    fn remove_missing_name_is_none() {
        let mut chain: ProcessorChain<u8> = ProcessorChain::default();
        chain.insert("gain", 1);
        assert_eq!(chain.remove("reverb"), None);
        assert_eq!(chain.remove("gain"), Some(1));
        assert!(chain.is_empty());
    }
}
