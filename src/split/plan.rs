use crate::cue::models::{Disc, Timestamp, format_seconds};
use thiserror::Error;

/// One track that will be cut from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Position of the track in the sheet, not its declared number.
    pub position: usize,
    pub number: u32,
    pub title: String,
    pub start: Timestamp,
    pub duration: Timestamp,
    /// `"<NN> - <title>"`, not yet sanitized.
    pub output_base_name: String,
}

/// Per-track problems; the track is left out of the plan and the album carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanWarning {
    #[error("track {number:02}: no usable INDEX 01/00 to take its {boundary} from")]
    TimingUnresolvable { number: u32, boundary: &'static str },

    #[error("track {number:02}: non-positive duration (start {start}s, end {end}s)")]
    DurationNonPositive {
        number: u32,
        start: String,
        end: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPlan {
    pub entries: Vec<PlanEntry>,
    pub warnings: Vec<PlanWarning>,
}

impl SplitPlan {
    pub fn planned_count(&self) -> usize {
        self.entries.len()
    }
}

/// Computes start and duration for every track in sheet order. Each track ends where
/// the next one in the sheet starts, the last one at `total`. Declared track numbers
/// never reorder anything.
pub fn resolve_plan(disc: &Disc, total: Timestamp) -> SplitPlan {
    let mut plan = SplitPlan::default();

    for (position, track) in disc.tracks.iter().enumerate() {
        let Some(start) = track.start() else {
            plan.warnings.push(PlanWarning::TimingUnresolvable {
                number: track.number,
                boundary: "start",
            });
            continue;
        };

        let end = match disc.tracks.get(position + 1) {
            Some(next) => next.start(),
            None => Some(total),
        };
        let Some(end) = end else {
            plan.warnings.push(PlanWarning::TimingUnresolvable {
                number: track.number,
                boundary: "end",
            });
            continue;
        };

        if end <= start {
            plan.warnings.push(PlanWarning::DurationNonPositive {
                number: track.number,
                start: format_seconds(start.as_millis()),
                end: format_seconds(end.as_millis()),
            });
            continue;
        }

        let padded = format!("{:02}", track.number);
        let title = track
            .title
            .clone()
            .unwrap_or_else(|| format!("Track {padded}"));

        plan.entries.push(PlanEntry {
            position,
            number: track.number,
            output_base_name: format!("{padded} - {title}"),
            title,
            start,
            duration: Timestamp::from_millis(end.as_millis() - start.as_millis()),
        });
    }

    plan
}
