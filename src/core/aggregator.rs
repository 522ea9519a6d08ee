use crate::domain::model::{DetailRow, LineItemRecord, StateSummary};
use std::collections::HashMap;

/// The 27 Brazilian federative units, used when padding the summary.
pub const BRAZILIAN_STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Registration shown on zero-valued padding rows.
pub const PADDING_REGISTRATION: &str = "-";

type GroupKey = (String, String);

/// Accumulates detail rows and per-(state, registration) totals.
///
/// Summary rows keep the order in which their key was first seen. Two
/// aggregators can be merged, which yields the same totals as feeding every
/// record into a single one.
#[derive(Debug, Default)]
pub struct Aggregator {
    detail: Vec<DetailRow>,
    summary: Vec<StateSummary>,
    index: HashMap<GroupKey, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_mut(&mut self, state: &str, registration: &str) -> &mut StateSummary {
        let key = (state.to_string(), registration.to_string());
        let position = match self.index.get(&key).copied() {
            Some(position) => position,
            None => {
                self.summary.push(StateSummary::empty(state, registration));
                let position = self.summary.len() - 1;
                self.index.insert(key, position);
                position
            }
        };
        &mut self.summary[position]
    }

    pub fn push(&mut self, record: LineItemRecord) {
        let row = DetailRow::from(record);
        self.group_mut(&row.record.destination_state, &row.record.taxpayer_registration)
            .add(&row);
        self.detail.push(row);
    }

    pub fn extend<I: IntoIterator<Item = LineItemRecord>>(&mut self, records: I) {
        for record in records {
            self.push(record);
        }
    }

    /// Fold another partial aggregation into this one.
    pub fn merge(mut self, other: Aggregator) -> Self {
        for partial in &other.summary {
            self.group_mut(&partial.state, &partial.registration)
                .absorb(partial);
        }
        self.detail.extend(other.detail);
        self
    }

    pub fn len(&self) -> usize {
        self.detail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_empty()
    }

    pub fn finish(self) -> (Vec<DetailRow>, Vec<StateSummary>) {
        (self.detail, self.summary)
    }
}

/// Group and sum a full record set in one go.
pub fn aggregate(records: Vec<LineItemRecord>) -> (Vec<DetailRow>, Vec<StateSummary>) {
    let mut aggregator = Aggregator::new();
    aggregator.extend(records);
    aggregator.finish()
}

/// Append a zero-valued row for every state that has no contributing record.
pub fn pad_states(summary: &mut Vec<StateSummary>) {
    for state in BRAZILIAN_STATES {
        if !summary.iter().any(|row| row.state == state) {
            summary.push(StateSummary::empty(state, PADDING_REGISTRATION));
        }
    }
}
