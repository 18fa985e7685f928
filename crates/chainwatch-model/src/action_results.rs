use chainwatch_stream::{Readable, StreamInput, StreamOutput, Writeable};
use chainwatch_types::Result;

use crate::action::ActionRunResult;

/// Action results keyed by action id, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResults {
    entries: Vec<(String, ActionRunResult)>,
}

impl ActionResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result. An existing entry for the same id is replaced in
    /// place and returned, keeping its original position.
    pub fn insert(
        &mut self,
        action_id: impl Into<String>,
        result: ActionRunResult,
    ) -> Option<ActionRunResult> {
        let action_id = action_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == action_id) {
            Some((_, existing)) => Some(std::mem::replace(existing, result)),
            None => {
                self.entries.push((action_id, result));
                None
            }
        }
    }

    pub fn get(&self, action_id: &str) -> Option<&ActionRunResult> {
        self.entries
            .iter()
            .find(|(id, _)| id == action_id)
            .map(|(_, result)| result)
    }

    pub fn contains_key(&self, action_id: &str) -> bool {
        self.get(action_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ActionRunResult)> {
        self.entries.iter().map(|(id, result)| (id.as_str(), result))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &ActionRunResult> {
        self.entries.iter().map(|(_, result)| result)
    }

    /// Failed results in insertion order.
    pub fn failures(&self) -> impl Iterator<Item = &ActionRunResult> {
        self.values().filter(|result| result.is_failed())
    }
}

impl<K: Into<String>> FromIterator<(K, ActionRunResult)> for ActionResults {
    fn from_iter<I: IntoIterator<Item = (K, ActionRunResult)>>(iter: I) -> Self {
        let mut results = Self::new();
        for (id, result) in iter {
            results.insert(id, result);
        }
        results
    }
}

impl Writeable for ActionResults {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()> {
        out.write_map(self.iter())
    }
}

impl Readable for ActionResults {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self> {
        // read_map rejects duplicate keys, so entries are unique here.
        Ok(Self {
            entries: input.read_map::<ActionRunResult>()?,
        })
    }
}
