use uuid::Uuid;

use super::{Dispatcher, Metadata};

/// A unit of work whose log events share one trace identifier.
///
/// Attributes are informational only; they are not attached to events.
/// Pass them as metadata explicitly when they should appear in the output.
#[derive(Debug, Clone)]
pub struct Transaction {
    trace_id: String,
    attributes: Metadata,
}

impl Transaction {
    pub fn new(attributes: Metadata) -> Self {
        Self {
            trace_id: Uuid::new_v4().hyphenated().to_string(),
            attributes,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn attributes(&self) -> &Metadata {
        &self.attributes
    }

    /// Returns a view of `base` whose events carry this transaction's trace id.
    pub fn logger_for(&self, base: &Dispatcher) -> Dispatcher {
        base.with_trace(self.trace_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn trace_ids_are_unique() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| Transaction::new(Metadata::new()).trace_id().to_string())
            .collect();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn trace_id_is_a_hyphenated_uuid() {
        let txn = Transaction::new(Metadata::new());
        assert!(Uuid::parse_str(txn.trace_id()).is_ok());
        assert_eq!(txn.trace_id().len(), 36);
    }

    #[test]
    fn keeps_attributes_and_binds_views() {
        let txn = Transaction::new(Metadata::from([("user_id".to_string(), json!("user123"))]));
        let base = Dispatcher::new();
        let view = txn.logger_for(&base);

        assert_eq!(txn.attributes()["user_id"], json!("user123"));
        assert_eq!(view.trace_id(), Some(txn.trace_id()));
        assert_eq!(base.trace_id(), None);
    }
}
