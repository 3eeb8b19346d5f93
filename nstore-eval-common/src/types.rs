use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Storage engine variants exercised by the benchmark binary.
///
/// Each variant has three spellings: the short CLI flag passed to the
/// benchmark, the upper-case label it prints in throughput reports, and the
/// canonical lower-case name used in the result store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    Wal,
    Sp,
    Lsm,
    OptWal,
    OptSp,
    OptLsm,
}

impl EngineVariant {
    pub const ALL: [EngineVariant; 6] = [
        EngineVariant::Wal,
        EngineVariant::Sp,
        EngineVariant::Lsm,
        EngineVariant::OptWal,
        EngineVariant::OptSp,
        EngineVariant::OptLsm,
    ];

    /// Canonical name, also the top-level directory in the result store
    pub fn name(self) -> &'static str {
        match self {
            EngineVariant::Wal => "wal",
            EngineVariant::Sp => "sp",
            EngineVariant::Lsm => "lsm",
            EngineVariant::OptWal => "opt_wal",
            EngineVariant::OptSp => "opt_sp",
            EngineVariant::OptLsm => "opt_lsm",
        }
    }

    /// Flag selecting this engine on the benchmark command line
    pub fn flag(self) -> &'static str {
        match self {
            EngineVariant::Wal => "-a",
            EngineVariant::Sp => "-s",
            EngineVariant::Lsm => "-m",
            EngineVariant::OptWal => "-w",
            EngineVariant::OptSp => "-c",
            EngineVariant::OptLsm => "-l",
        }
    }

    /// Label printed at the start of a throughput report line
    pub fn label(self) -> &'static str {
        match self {
            EngineVariant::Wal => "WAL",
            EngineVariant::Sp => "SP",
            EngineVariant::Lsm => "LSM",
            EngineVariant::OptWal => "OPT_WAL",
            EngineVariant::OptSp => "OPT_SP",
            EngineVariant::OptLsm => "OPT_LSM",
        }
    }

    /// Legend entry used by chart exports
    pub fn chart_label(self) -> &'static str {
        match self {
            EngineVariant::Wal => "WAL-2X",
            EngineVariant::Sp => "SP-2X",
            EngineVariant::Lsm => "LSM-2X",
            EngineVariant::OptWal => "PM-WAL-2X",
            EngineVariant::OptSp => "PM-SP-2X",
            EngineVariant::OptLsm => "PM-LSM-2X",
        }
    }

    pub fn from_flag(flag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.flag() == flag)
            .ok_or_else(|| EvalError::UnknownEngineFlag(flag.to_string()))
    }

    pub fn from_label(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.label() == label)
            .ok_or_else(|| EvalError::UnknownEngineLabel(label.to_string()))
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineVariant {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| EvalError::UnknownEngineLabel(s.to_string()))
    }
}

/// Workload category derived from the write fraction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadCategory {
    ReadOnly,
    ReadHeavy,
    WriteHeavy,
}

impl WorkloadCategory {
    pub const ALL: [WorkloadCategory; 3] = [
        WorkloadCategory::ReadOnly,
        WorkloadCategory::ReadHeavy,
        WorkloadCategory::WriteHeavy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadCategory::ReadOnly => "read-only",
            WorkloadCategory::ReadHeavy => "read-heavy",
            WorkloadCategory::WriteHeavy => "write-heavy",
        }
    }

    /// Exact match on the three known mixes; anything else is unclassified.
    pub fn from_rw_mix(rw_mix: f64) -> Option<Self> {
        if rw_mix == 0.0 {
            Some(WorkloadCategory::ReadOnly)
        } else if rw_mix == 0.1 {
            Some(WorkloadCategory::ReadHeavy)
        } else if rw_mix == 0.5 {
            Some(WorkloadCategory::WriteHeavy)
        } else {
            None
        }
    }

    pub fn classify(rw_mix: f64) -> Result<Self> {
        Self::from_rw_mix(rw_mix).ok_or_else(|| EvalError::UnclassifiedRwMix(rw_mix.to_string()))
    }
}

impl fmt::Display for WorkloadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fractional sweep parameter as it appeared in the log.
///
/// The text is kept verbatim because it is what lands in the result store
/// (`0.10`, not `0.1`); ordering and equality use the numeric value first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepValue {
    value: f64,
    text: String,
}

impl SweepValue {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let value: f64 = text
            .parse()
            .map_err(|_| EvalError::InvalidNumber(text.to_string()))?;
        if !value.is_finite() {
            return Err(EvalError::InvalidNumber(text.to_string()));
        }
        Ok(Self {
            value,
            text: text.to_string(),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for SweepValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SweepValue {}

impl PartialOrd for SweepValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SweepValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl Hash for SweepValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.to_bits().hash(state);
        self.text.hash(state);
    }
}

impl fmt::Display for SweepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Grouping key for throughput samples: one experimental condition.
///
/// Field order defines the sort order used for every output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeasurementKey {
    pub rw_mix: SweepValue,
    pub skew: SweepValue,
    pub latency: u32,
    pub engine: EngineVariant,
}

impl MeasurementKey {
    pub fn workload(&self) -> Result<WorkloadCategory> {
        WorkloadCategory::from_rw_mix(self.rw_mix.value())
            .ok_or_else(|| EvalError::UnclassifiedRwMix(self.rw_mix.text().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_engine_spellings() {
        let flags: Vec<_> = EngineVariant::ALL.iter().map(|e| e.flag()).collect();
        assert_eq!(flags, vec!["-a", "-s", "-m", "-w", "-c", "-l"]);

        let names: Vec<_> = EngineVariant::ALL.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["wal", "sp", "lsm", "opt_wal", "opt_sp", "opt_lsm"]);

        assert_eq!(EngineVariant::from_label("OPT_LSM").unwrap(), EngineVariant::OptLsm);
        assert!(EngineVariant::from_label("wal").is_err());
        assert!(EngineVariant::from_flag("-z").is_err());
    }

    #[test]
    fn test_engine_serde_uses_canonical_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            engines: Vec<EngineVariant>,
        }
        let parsed: Wrapper = toml::from_str(r#"engines = ["opt_wal", "lsm"]"#).unwrap();
        assert_eq!(parsed.engines, vec![EngineVariant::OptWal, EngineVariant::Lsm]);
    }

    #[test]
    fn test_workload_classification() {
        assert_eq!(WorkloadCategory::from_rw_mix(0.0), Some(WorkloadCategory::ReadOnly));
        assert_eq!(WorkloadCategory::from_rw_mix(0.1), Some(WorkloadCategory::ReadHeavy));
        assert_eq!(WorkloadCategory::from_rw_mix(0.5), Some(WorkloadCategory::WriteHeavy));
        assert_eq!(WorkloadCategory::from_rw_mix(0.3), None);
        assert!(matches!(
            WorkloadCategory::classify(0.9),
            Err(EvalError::UnclassifiedRwMix(_))
        ));
    }

    #[test]
    fn test_sweep_value_keeps_text() {
        let skew = SweepValue::parse(" 0.10 ").unwrap();
        assert_eq!(skew.text(), "0.10");
        assert_eq!(skew.value(), 0.1);
        assert!(SweepValue::parse("abc").is_err());
        assert!(SweepValue::parse("NaN").is_err());
    }

    #[test]
    fn test_key_ordering_is_numeric() {
        let key = |rw: &str, skew: &str, latency, engine| MeasurementKey {
            rw_mix: SweepValue::parse(rw).unwrap(),
            skew: SweepValue::parse(skew).unwrap(),
            latency,
            engine,
        };
        let mut keys = vec![
            key("0.5", "0.10", 200, EngineVariant::Wal),
            key("0.0", "1.00", 800, EngineVariant::Sp),
            key("0.0", "0.10", 1000, EngineVariant::Wal),
            key("0.0", "0.10", 200, EngineVariant::OptLsm),
            key("0.0", "0.10", 200, EngineVariant::Wal),
        ];
        keys.sort();
        let order: Vec<_> = keys.iter().map(|k| (k.skew.text().to_string(), k.latency, k.engine)).collect();
        assert_eq!(
            order,
            vec![
                ("0.10".to_string(), 200, EngineVariant::Wal),
                ("0.10".to_string(), 200, EngineVariant::OptLsm),
                ("0.10".to_string(), 1000, EngineVariant::Wal),
                ("1.00".to_string(), 800, EngineVariant::Sp),
                ("0.10".to_string(), 200, EngineVariant::Wal),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_engine_mapping_is_bijective(idx in 0usize..6) {
            let engine = EngineVariant::ALL[idx];
            prop_assert_eq!(EngineVariant::from_flag(engine.flag()).unwrap(), engine);
            prop_assert_eq!(EngineVariant::from_label(engine.label()).unwrap(), engine);
            prop_assert_eq!(engine.name().parse::<EngineVariant>().unwrap(), engine);
            let collisions = EngineVariant::ALL
                .iter()
                .filter(|other| other.name() == engine.name() || other.flag() == engine.flag())
                .count();
            prop_assert_eq!(collisions, 1);
        }
    }
}
