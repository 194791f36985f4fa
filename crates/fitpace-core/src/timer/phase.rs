use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// One named sub-state of a phase cycle (e.g. "inhale" for 4 seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub duration_secs: u64,
}

impl Phase {
    pub fn new(name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
        }
    }
}

impl FromStr for Phase {
    type Err = TimerError;

    /// Parses `name:secs`, e.g. `inhale:4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, secs) = s
            .split_once(':')
            .ok_or_else(|| TimerError::invalid("phases", format!("expected name:secs, got '{s}'")))?;
        let name = name.trim();
        let secs = secs.trim();
        if secs.starts_with('-') {
            return Err(TimerError::invalid(
                "phases",
                format!("phase '{name}' has a negative duration"),
            ));
        }
        let duration_secs = secs.parse::<u64>().map_err(|_| {
            TimerError::invalid("phases", format!("cannot parse '{secs}' as seconds"))
        })?;
        Ok(Phase::new(name, duration_secs))
    }
}

/// A validated, non-empty, repeating sequence of phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseCycle {
    phases: Vec<Phase>,
}

impl PhaseCycle {
    /// Validate and build a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] if the list is empty, a
    /// name is blank, or a duration is zero.
    pub fn new(phases: Vec<Phase>) -> Result<Self, TimerError> {
        if phases.is_empty() {
            return Err(TimerError::invalid("phases", "phase cycle must not be empty"));
        }
        for (i, phase) in phases.iter().enumerate() {
            if phase.name.trim().is_empty() {
                return Err(TimerError::invalid(
                    "phases",
                    format!("phase {i} has an empty name"),
                ));
            }
            if phase.duration_secs == 0 {
                return Err(TimerError::invalid(
                    "phases",
                    format!("phase '{}' must last at least one second", phase.name),
                ));
            }
        }
        Ok(Self { phases })
    }

    /// Parse a comma-separated list such as `inhale:4,hold:4,exhale:4`.
    pub fn parse(list: &str) -> Result<Self, TimerError> {
        let phases = list
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Phase::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(phases)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false for a constructed cycle; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    /// Length of one full pass through the cycle.
    pub fn cycle_duration_secs(&self) -> u64 {
        self.phases
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.duration_secs))
    }

    /// Index that follows `index`, wrapping at the end.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.phases.len()
    }
}

impl TryFrom<Vec<Phase>> for PhaseCycle {
    type Error = TimerError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseCycle> for Vec<Phase> {
    fn from(cycle: PhaseCycle) -> Self {
        cycle.phases
    }
}

/// Validated input to a timer session: target duration plus optional cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    total_duration_secs: u64,
    phase_cycle: Option<PhaseCycle>,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] for a zero duration or an
    /// invalid phase list.
    pub fn new(total_duration_secs: u64, phases: Option<Vec<Phase>>) -> Result<Self, TimerError> {
        if total_duration_secs == 0 {
            return Err(TimerError::invalid(
                "total_duration_secs",
                "must be greater than zero",
            ));
        }
        let phase_cycle = phases.map(PhaseCycle::new).transpose()?;
        Ok(Self {
            total_duration_secs,
            phase_cycle,
        })
    }

    pub fn with_cycle(total_duration_secs: u64, cycle: PhaseCycle) -> Result<Self, TimerError> {
        let mut config = Self::new(total_duration_secs, None)?;
        config.phase_cycle = Some(cycle);
        Ok(config)
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.total_duration_secs
    }

    pub fn phase_cycle(&self) -> Option<&PhaseCycle> {
        self.phase_cycle.as_ref()
    }
}
