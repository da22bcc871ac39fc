//! Petri-net construction from the directly-follows relation

use std::collections::{BTreeMap, BTreeSet};

use super::{DiscoveryEngine, DiscoveryError};
use crate::types::{Event, Snapshot};

/// Name of the place every trace starts from
pub const START_PLACE: &str = "start";
/// Name of the place every trace ends in
pub const END_PLACE: &str = "end";

/// Builds a net with one transition per activity and one place per
/// directly-follows pair `a->b`, framed by `start` and `end` places.
///
/// Edges refer to nodes by name, so a place name never equals an activity:
/// a clashing place gets `'` appended until it is unique. Inside pair
/// places, `\` and `>` of activity names are backslash-escaped so two
/// different pairs never share a place.
#[derive(Debug, Clone, Default)]
pub struct DirectlyFollowsMiner;

impl DirectlyFollowsMiner {
    pub fn new() -> Self {
        Self
    }

    fn pair_place(from: &str, to: &str) -> String {
        format!("{}->{}", escape(from), escape(to))
    }

    /// Final name of every place, keyed by its unadjusted name
    fn place_names(bases: BTreeSet<String>, activities: &BTreeSet<&str>) -> BTreeMap<String, String> {
        let mut taken: BTreeSet<String> = activities.iter().map(|a| a.to_string()).collect();
        let mut names = BTreeMap::new();
        for base in bases {
            let mut name = base.clone();
            while taken.contains(&name) {
                name.push('\'');
            }
            taken.insert(name.clone());
            names.insert(base, name);
        }
        names
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('>', "\\>")
}

impl DiscoveryEngine for DirectlyFollowsMiner {
    fn discover(&self, _log: &str, events: &[Event]) -> Result<Snapshot, DiscoveryError> {
        // Traces by case id, keeping history order within each trace
        let mut traces: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for event in events {
            traces
                .entry(event.case_id.as_str())
                .or_default()
                .push(event.activity.as_str());
        }

        let mut snapshot = Snapshot::new();
        if traces.is_empty() {
            return Ok(snapshot);
        }

        let mut activities = BTreeSet::new();
        let mut firsts = BTreeSet::new();
        let mut lasts = BTreeSet::new();
        let mut pairs = BTreeSet::new();
        for trace in traces.values() {
            activities.extend(trace.iter().copied());
            if let (Some(first), Some(last)) = (trace.first(), trace.last()) {
                firsts.insert(*first);
                lasts.insert(*last);
            }
            for pair in trace.windows(2) {
                pairs.insert((pair[0], pair[1]));
            }
        }

        let mut bases: BTreeSet<String> = [START_PLACE, END_PLACE].iter().map(|p| p.to_string()).collect();
        bases.extend(pairs.iter().map(|(a, b)| Self::pair_place(a, b)));
        let names = Self::place_names(bases, &activities);
        let place = |base: &str| names.get(base).cloned().unwrap_or_else(|| base.to_string());

        let start = place(START_PLACE);
        let end = place(END_PLACE);
        snapshot.add_place(start.clone());
        snapshot.add_place(end.clone());

        for activity in &activities {
            snapshot.add_transition(*activity);
        }
        for first in firsts {
            snapshot.add_edge(start.clone(), first);
        }
        for last in lasts {
            snapshot.add_edge(last, end.clone());
        }
        for (from, to) in pairs {
            let between = place(&Self::pair_place(from, to));
            snapshot.add_place(between.clone());
            snapshot.add_edge(from, between.clone());
            snapshot.add_edge(between, to);
        }

        Ok(snapshot)
    }
}
