//! Timing ledger - seconds spent per phase per iteration

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;

/// Phase of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Preproc,
    Call,
    Postproc,
    Save,
    Loop,
}

/// Per-phase samples plus one-off measurements
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Timings {
    pub load: Vec<f64>,
    pub preproc: Vec<f64>,
    pub call: Vec<f64>,
    pub postproc: Vec<f64>,
    pub save: Vec<f64>,
    #[serde(rename = "loop")]
    pub loops: Vec<f64>,
    pub prepare: f64,
    pub first: f64,
    pub last: f64,
    pub total: f64,
    /// Unix timestamp of the run start
    pub time0: f64,
}

impl Timings {
    pub fn new(time0: f64) -> Self {
        Self {
            time0,
            ..Self::default()
        }
    }

    pub fn record(&mut self, phase: Phase, since: Instant) {
        let secs = since.elapsed().as_secs_f64();
        self.samples_mut(phase).push(secs);
    }

    fn samples_mut(&mut self, phase: Phase) -> &mut Vec<f64> {
        match phase {
            Phase::Load => &mut self.load,
            Phase::Preproc => &mut self.preproc,
            Phase::Call => &mut self.call,
            Phase::Postproc => &mut self.postproc,
            Phase::Save => &mut self.save,
            Phase::Loop => &mut self.loops,
        }
    }

    fn phases(&self) -> [(&'static str, &[f64]); 6] {
        [
            ("loop", self.loops.as_slice()),
            ("load", self.load.as_slice()),
            ("preproc", self.preproc.as_slice()),
            ("call", self.call.as_slice()),
            ("postproc", self.postproc.as_slice()),
            ("save", self.save.as_slice()),
        ]
    }

    /// Text report: one-off measurements, then mean/min/max per phase
    pub fn summary(&self) -> String {
        let mut out = format!(
            "total: {:.6} | prepare: {:.6} | first: {:.6} | last: {:.6}\n",
            self.total, self.prepare, self.first, self.last
        );
        let rows: Vec<_> = self
            .phases()
            .into_iter()
            .filter(|(_, data)| !data.is_empty())
            .collect();
        if rows.is_empty() {
            return out;
        }
        let _ = writeln!(out, "{:<8}  {:>10}  {:>10}  {:>10}", "", "mean", "min", "max");
        for (name, data) in rows {
            let mean = data.iter().sum::<f64>() / data.len() as f64;
            let min = data.iter().copied().fold(f64::INFINITY, f64::min);
            let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let _ = writeln!(out, "{:<8}  {:>10.6}  {:>10.6}  {:>10.6}", name, mean, min, max);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_lists_recorded_phases_only() {
        let mut t = Timings::new(0.0);
        t.call = vec![1.0, 3.0];
        t.total = 4.0;
        let s = t.summary();
        assert!(s.starts_with("total: 4.000000"));
        assert!(s.contains("call"));
        assert!(s.contains("2.000000"));
        assert!(!s.contains("save"));
    }

    #[test]
    fn serializes_loop_field() {
        let mut t = Timings::new(10.0);
        t.loops.push(0.5);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["loop"], json!([0.5]));
        assert_eq!(v["time0"], json!(10.0));
    }

    #[test]
    fn record_appends_sample() {
        let mut t = Timings::default();
        t.record(Phase::Load, Instant::now());
        assert_eq!(t.load.len(), 1);
    }
}
