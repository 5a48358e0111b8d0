//! Folding member services into composite group timelines

use crate::buckets::NO_UPTIME;
use crate::services::GroupDescriptor;
use crate::status::{DayStatus, Outcome, worst_of};
use crate::timeline::{ServiceReport, StatusTimeline};
use serde::{Deserialize, Serialize};

/// How a member's day status combines with the group's running status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Commutative worst-of; member order never matters.
    #[default]
    WorstOf,
    /// Each member overwrites the running status unless it is already a
    /// failure. Failure absorbs, everything else is last-writer-wins, so a
    /// warning followed by a success reads as success.
    StickyFailure,
}

impl MergePolicy {
    /// Combine the running group status with one member's status.
    pub fn combine(&self, current: DayStatus, incoming: DayStatus) -> DayStatus {
        match self {
            MergePolicy::WorstOf => worst_of(current, incoming),
            MergePolicy::StickyFailure => match (current, incoming) {
                (Some(Outcome::Failure), _) => current,
                (_, None) => current,
                (_, Some(_)) => incoming,
            },
        }
    }
}

impl From<&str> for MergePolicy {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sticky-failure" | "sticky" | "legacy" => MergePolicy::StickyFailure,
            _ => MergePolicy::WorstOf,
        }
    }
}

/// Fold member timelines, in order, into one composite timeline.
pub fn reduce_group<'a, I>(members: I, days: usize, policy: MergePolicy) -> StatusTimeline
where
    I: IntoIterator<Item = &'a StatusTimeline>,
{
    members
        .into_iter()
        .fold(StatusTimeline::empty(days), |mut composite, member| {
            for day in 0..days {
                let merged = policy.combine(composite.get(day), member.get(day));
                composite.set(day, merged);
            }
            composite
        })
}

/// Composite status of a configured group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub group: GroupDescriptor,
    pub members: Vec<String>,
    pub timeline: StatusTimeline,
    pub up_time: String,
}

impl GroupReport {
    /// Build a group from `(member key, report)` pairs in configured order.
    pub fn build(
        group: GroupDescriptor,
        members: &[(String, ServiceReport)],
        days: usize,
        policy: MergePolicy,
    ) -> Self {
        let timeline = reduce_group(members.iter().map(|(_, r)| &r.timeline), days, policy);
        let up_time = group
            .up_time
            .clone()
            .unwrap_or_else(|| NO_UPTIME.to_string());

        Self {
            group,
            members: members.iter().map(|(key, _)| key.clone()).collect(),
            timeline,
            up_time,
        }
    }
}
