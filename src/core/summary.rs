//! Attendance statistics over a snapshot
//!
//! Produces the JSON payload handed to the insights collaborator. Only rows
//! that would be exported are counted.

use super::snapshot::GridSnapshot;
use crate::error::GridResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub headers: Vec<String>,
    pub tracked_days: usize,
    pub members: Vec<MemberSummary>,
    pub days: Vec<DayTotal>,
    /// Present marks over all member-days, 0.0 when nothing is tracked
    pub overall_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    /// 1-based grid row
    pub row: usize,
    /// First static field, usually the name
    pub label: String,
    pub present: usize,
    pub absent: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub date: String,
    pub present: usize,
    pub absent: usize,
}

impl AttendanceSummary {
    /// Fails with [`GridError::InvalidSnapshot`] when rows and labels disagree in shape.
    ///
    /// [`GridError::InvalidSnapshot`]: crate::error::GridError::InvalidSnapshot
    pub fn from_snapshot(snapshot: &GridSnapshot) -> GridResult<Self> {
        snapshot.validate()?;

        let tracked_days = snapshot.date_column_count();
        let mut day_present = vec![0usize; tracked_days];

        let members: Vec<MemberSummary> = snapshot
            .included_rows()
            .map(|(row, data)| {
                for (count, present) in day_present.iter_mut().zip(&data.attendance) {
                    if *present {
                        *count += 1;
                    }
                }
                let present = data.present_count();
                MemberSummary {
                    row,
                    label: data.fields.first().cloned().unwrap_or_default(),
                    present,
                    absent: tracked_days.saturating_sub(present),
                    rate: ratio(present, tracked_days),
                }
            })
            .collect();

        let member_count = members.len();
        let days = snapshot
            .date_labels
            .iter()
            .zip(day_present)
            .map(|(date, present)| DayTotal {
                date: date.clone(),
                present,
                absent: member_count.saturating_sub(present),
            })
            .collect();

        let total_present: usize = members.iter().map(|m| m.present).sum();

        Ok(Self {
            headers: snapshot.headers.clone(),
            tracked_days,
            overall_rate: ratio(total_present, member_count * tracked_days),
            members,
            days,
        })
    }

    pub fn to_json(&self) -> GridResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Members whose rate is strictly below `threshold`
    pub fn below(&self, threshold: f64) -> impl Iterator<Item = &MemberSummary> {
        self.members.iter().filter(move |m| m.rate < threshold)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
