//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Serves interactions from a loaded cassette, one port/method stream at a time.
///
/// Calls that carry no input (the clock) are served strictly in order.
/// Calls keyed by an account are served by matching their input, because
/// discovery issues them concurrently and their order is not stable.
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the given
    /// port/method combination.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let available = self.available();
        let queue = self.queue_mut(port, method, &available);
        queue.pop_front().unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: all interactions for port={port:?} method={method:?} \
                 have been consumed"
            )
        })
    }

    /// Return the first unconsumed interaction whose input equals `input`.
    ///
    /// # Panics
    ///
    /// Panics if no remaining interaction for the port/method has that input.
    pub fn next_matching(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Interaction {
        let available = self.available();
        let queue = self.queue_mut(port, method, &available);
        let position = queue.iter().position(|i| &i.input == input).unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: no remaining interaction for port={port:?} \
                 method={method:?} with input {input}"
            )
        });
        queue.remove(position).expect("position is within the queue")
    }

    /// Number of interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    fn available(&self) -> Vec<String> {
        self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect()
    }

    fn queue_mut(
        &mut self,
        port: &str,
        method: &str,
        available: &[String],
    ) -> &mut VecDeque<Interaction> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        self.queues.get_mut(&key).unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            )
        })
    }
}
