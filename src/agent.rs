use url::Url;

/// Turns a resolved node name into the URL a machine uses to attach as a worker.
pub trait AgentUrlPublisher: Send + Sync {
    fn agent_url(&self, node_name: &str) -> Option<String>;
}

/// Publishes `{root_url}/computer/{node}/slave-agent.jnlp`.
#[derive(Debug, Clone)]
pub struct JnlpAgentPublisher {
    root_url: String,
}

impl JnlpAgentPublisher {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
        }
    }
}

impl AgentUrlPublisher for JnlpAgentPublisher {
    fn agent_url(&self, node_name: &str) -> Option<String> {
        let mut url = Url::parse(&self.root_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["computer", node_name, "slave-agent.jnlp"]);
        Some(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_jnlp_urls() {
        let publisher = JnlpAgentPublisher::new("http://localhost:8080/hudson/");
        assert_eq!(
            publisher.agent_url("virtual").as_deref(),
            Some("http://localhost:8080/hudson/computer/virtual/slave-agent.jnlp")
        );
        assert_eq!(
            publisher.agent_url("vm a").as_deref(),
            Some("http://localhost:8080/hudson/computer/vm%20a/slave-agent.jnlp")
        );
    }

    #[test]
    fn broken_root_publishes_nothing() {
        assert!(JnlpAgentPublisher::new("::nope").agent_url("virtual").is_none());
    }
}
