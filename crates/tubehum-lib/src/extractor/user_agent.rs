use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out user agents round-robin, shared by all workers.
#[derive(Debug, Default)]
pub struct UserAgentPool {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl UserAgentPool {
    pub fn new(agents: Vec<String>) -> Self {
        let agents = agents
            .into_iter()
            .map(|agent| agent.trim().to_string())
            .filter(|agent| !agent.is_empty())
            .collect();
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }

    pub fn next_agent(&self) -> Option<String> {
        if self.agents.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        Some(self.agents[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_through_agents() {
        let pool = UserAgentPool::new(vec!["a".into(), "b".into()]);
        assert_eq!(pool.next_agent().as_deref(), Some("a"));
        assert_eq!(pool.next_agent().as_deref(), Some("b"));
        assert_eq!(pool.next_agent().as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_pool_yields_nothing() {
        let pool = UserAgentPool::new(vec!["  ".into()]);
        assert_eq!(pool.next_agent(), None);
    }
}
