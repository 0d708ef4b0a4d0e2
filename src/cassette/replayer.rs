//! Serves recorded interactions back in order.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct CallKey {
    port: String,
    method: String,
}

/// Replays a cassette, one queue per port/method pair.
///
/// Calls to different methods may interleave freely; calls to the same
/// method must arrive in recorded order.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<CallKey, Vec<Interaction>>,
    cursors: HashMap<CallKey, usize>,
}

impl CassetteReplayer {
    /// Builds a replayer over a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<CallKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key =
                CallKey { port: interaction.port.clone(), method: interaction.method.clone() };
            queues.entry(key).or_default().push(interaction.clone());
        }
        Self { queues, cursors: HashMap::new() }
    }

    /// Returns the next interaction recorded for `port`/`method`.
    ///
    /// # Panics
    ///
    /// Panics when the cassette holds no further interaction for the pair,
    /// naming what was asked for and what the cassette does contain.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> &Interaction {
        let key = CallKey { port: port.to_string(), method: method.to_string() };
        let queue = self.queues.get(&key).unwrap_or_else(|| {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        });
        let cursor = self.cursors.entry(key).or_insert(0);
        assert!(
            *cursor < queue.len(),
            "Cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
             have been consumed. Last interaction was seq={last_seq}.",
            count = queue.len(),
            last_seq = queue.last().map_or(0, |i| i.seq),
        );
        let interaction = &queue[*cursor];
        *cursor += 1;
        interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn call(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input: json!({}),
            output,
        }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            tool_version: "0.1.0".into(),
            interactions,
        }
    }

    #[test]
    fn serves_each_method_in_recorded_order() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![
            call(0, "fs", "exists", json!(true)),
            call(1, "fs", "is_file", json!(true)),
            call(2, "fs", "exists", json!(false)),
        ]));

        assert_eq!(replayer.next_interaction("fs", "is_file").seq, 1);
        assert_eq!(replayer.next_interaction("fs", "exists").output, json!(true));
        assert_eq!(replayer.next_interaction("fs", "exists").output, json!(false));
    }

    #[test]
    fn ports_have_separate_queues() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![
            call(0, "catalog", "locate", json!({"found": true})),
            call(1, "fs", "locate", json!("other")),
        ]));
        assert_eq!(replayer.next_interaction("fs", "locate").seq, 1);
        assert_eq!(replayer.next_interaction("catalog", "locate").seq, 0);
    }

    #[test]
    #[should_panic(expected = "have been consumed")]
    fn exhausted_method_panics() {
        let mut replayer =
            CassetteReplayer::new(&cassette(vec![call(0, "fs", "touch", json!({"ok": null}))]));
        let _ = replayer.next_interaction("fs", "touch");
        let _ = replayer.next_interaction("fs", "touch");
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_method_panics() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![]));
        let _ = replayer.next_interaction("fs", "hard_link");
    }
}
