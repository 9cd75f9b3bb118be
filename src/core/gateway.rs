/// Last-seen gateway metadata: which model and provider served the most
/// recent reply. Both start unknown and persist until overwritten; nothing
/// clears them mid-session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayInfo {
    pub model: Option<String>,
    pub provider: Option<String>,
}

impl GatewayInfo {
    pub fn is_known(&self) -> bool {
        self.model.is_some() || self.provider.is_some()
    }
}

#[derive(Debug, Default)]
pub struct GatewayTracker {
    info: GatewayInfo,
}

impl GatewayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &GatewayInfo {
        &self.info
    }

    /// Store the identifiers from the latest response and report whether
    /// either differs from what was stored before. Absent vs. present counts
    /// as a change; identical values (including both absent) do not. Storage
    /// is unconditional, latest writer wins.
    pub fn update(&mut self, model: Option<String>, provider: Option<String>) -> bool {
        let incoming = GatewayInfo { model, provider };
        let changed = incoming != self.info;
        self.info = incoming;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(model: &str, provider: &str) -> (Option<String>, Option<String>) {
        (Some(model.to_string()), Some(provider.to_string()))
    }

    #[test]
    fn first_update_with_values_is_a_change() {
        let mut tracker = GatewayTracker::new();
        let (model, provider) = ids("llama-3", "cf");
        assert!(tracker.update(model, provider));
        assert_eq!(tracker.info().model.as_deref(), Some("llama-3"));
        assert_eq!(tracker.info().provider.as_deref(), Some("cf"));
    }

    #[test]
    fn repeated_identical_update_is_not_a_change() {
        let mut tracker = GatewayTracker::new();
        let (model, provider) = ids("llama-3", "cf");
        assert!(tracker.update(model.clone(), provider.clone()));
        assert!(!tracker.update(model, provider));
    }

    #[test]
    fn either_field_differing_is_a_change() {
        let mut tracker = GatewayTracker::new();
        let (model, provider) = ids("llama-3", "cf");
        tracker.update(model.clone(), provider);
        assert!(tracker.update(model, Some("openai".to_string())));
        assert_eq!(tracker.info().provider.as_deref(), Some("openai"));
    }

    #[test]
    fn both_absent_twice_is_not_a_change() {
        let mut tracker = GatewayTracker::new();
        assert!(!tracker.update(None, None));
        assert!(!tracker.info().is_known());
    }

    #[test]
    fn present_to_absent_is_a_change() {
        let mut tracker = GatewayTracker::new();
        let (model, provider) = ids("llama-3", "cf");
        tracker.update(model, provider);
        assert!(tracker.update(None, None));
        assert!(!tracker.info().is_known());
    }
}
