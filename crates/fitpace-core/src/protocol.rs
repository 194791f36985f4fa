//! Preset protocols that resolve to a [`SessionConfig`].
//!
//! Fasting protocols are long single countdowns; meditation sessions are a
//! countdown with an optional breathing cycle on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;
use crate::format::format_compact;
use crate::search::Searchable;
use crate::timer::{Phase, PhaseCycle, SessionConfig};

const SECS_PER_HOUR: u64 = 3600;
const MAX_CUSTOM_FAST_HOURS: u32 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastingProtocol {
    /// 13:11
    Circadian,
    /// 16:8
    Lean,
    /// 18:6
    EighteenSix,
    /// 20:4
    Warrior,
    /// 23:1
    Omad,
    Extended36,
    Custom { fasting_hours: u32 },
}

impl FastingProtocol {
    pub const PRESETS: [FastingProtocol; 6] = [
        FastingProtocol::Circadian,
        FastingProtocol::Lean,
        FastingProtocol::EighteenSix,
        FastingProtocol::Warrior,
        FastingProtocol::Omad,
        FastingProtocol::Extended36,
    ];

    pub fn fasting_hours(&self) -> u32 {
        match self {
            FastingProtocol::Circadian => 13,
            FastingProtocol::Lean => 16,
            FastingProtocol::EighteenSix => 18,
            FastingProtocol::Warrior => 20,
            FastingProtocol::Omad => 23,
            FastingProtocol::Extended36 => 36,
            FastingProtocol::Custom { fasting_hours } => *fasting_hours,
        }
    }

    /// Hours left in a 24h day after the fast; 0 for fasts of a day or more.
    pub fn eating_window_hours(&self) -> u32 {
        24u32.saturating_sub(self.fasting_hours())
    }

    pub fn fasting_secs(&self) -> u64 {
        u64::from(self.fasting_hours()) * SECS_PER_HOUR
    }

    pub fn title(&self) -> String {
        match self {
            FastingProtocol::Circadian => "Circadian 13:11".into(),
            FastingProtocol::Lean => "Lean 16:8".into(),
            FastingProtocol::EighteenSix => "18:6".into(),
            FastingProtocol::Warrior => "Warrior 20:4".into(),
            FastingProtocol::Omad => "One Meal a Day (23:1)".into(),
            FastingProtocol::Extended36 => "Extended 36h".into(),
            FastingProtocol::Custom { fasting_hours } => format!("Custom {fasting_hours}h"),
        }
    }
}

impl fmt::Display for FastingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FastingProtocol::Omad => f.write_str("omad"),
            FastingProtocol::Extended36 => f.write_str("36h"),
            FastingProtocol::Custom { fasting_hours } => write!(f, "custom:{fasting_hours}"),
            other => write!(f, "{}:{}", other.fasting_hours(), other.eating_window_hours()),
        }
    }
}

impl FromStr for FastingProtocol {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let protocol = match normalized.as_str() {
            "13:11" => FastingProtocol::Circadian,
            "16:8" => FastingProtocol::Lean,
            "18:6" => FastingProtocol::EighteenSix,
            "20:4" => FastingProtocol::Warrior,
            "omad" | "23:1" => FastingProtocol::Omad,
            "36h" => FastingProtocol::Extended36,
            other => {
                let hours = other.strip_prefix("custom:").ok_or_else(|| {
                    TimerError::invalid("fasting_protocol", format!("unknown protocol '{s}'"))
                })?;
                let fasting_hours = hours.parse::<u32>().map_err(|_| {
                    TimerError::invalid("fasting_protocol", format!("cannot parse '{hours}' as hours"))
                })?;
                if fasting_hours == 0 || fasting_hours > MAX_CUSTOM_FAST_HOURS {
                    return Err(TimerError::invalid(
                        "fasting_protocol",
                        format!("custom fast must be 1..={MAX_CUSTOM_FAST_HOURS} hours"),
                    ));
                }
                FastingProtocol::Custom { fasting_hours }
            }
        };
        Ok(protocol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathingPattern {
    /// 4-4-4-4
    Box,
    /// 4-7-8
    FourSevenEight,
    /// 5-5
    Coherent,
    /// 4-2-6
    Relax,
}

impl BreathingPattern {
    pub const ALL: [BreathingPattern; 4] = [
        BreathingPattern::Box,
        BreathingPattern::FourSevenEight,
        BreathingPattern::Coherent,
        BreathingPattern::Relax,
    ];

    pub fn phases(&self) -> Vec<Phase> {
        match self {
            BreathingPattern::Box => vec![
                Phase::new("inhale", 4),
                Phase::new("hold", 4),
                Phase::new("exhale", 4),
                Phase::new("hold", 4),
            ],
            BreathingPattern::FourSevenEight => vec![
                Phase::new("inhale", 4),
                Phase::new("hold", 7),
                Phase::new("exhale", 8),
            ],
            BreathingPattern::Coherent => {
                vec![Phase::new("inhale", 5), Phase::new("exhale", 5)]
            }
            BreathingPattern::Relax => vec![
                Phase::new("inhale", 4),
                Phase::new("hold", 2),
                Phase::new("exhale", 6),
            ],
        }
    }

    pub fn cycle(&self) -> Result<PhaseCycle, TimerError> {
        PhaseCycle::new(self.phases())
    }

    pub fn title(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Box breathing",
            BreathingPattern::FourSevenEight => "4-7-8 breathing",
            BreathingPattern::Coherent => "Coherent breathing",
            BreathingPattern::Relax => "Relaxing breath",
        }
    }
}

impl fmt::Display for BreathingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BreathingPattern::Box => "box",
            BreathingPattern::FourSevenEight => "4-7-8",
            BreathingPattern::Coherent => "coherent",
            BreathingPattern::Relax => "relax",
        })
    }
}

impl FromStr for BreathingPattern {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(BreathingPattern::Box),
            "4-7-8" | "478" => Ok(BreathingPattern::FourSevenEight),
            "coherent" => Ok(BreathingPattern::Coherent),
            "relax" => Ok(BreathingPattern::Relax),
            _ => Err(TimerError::invalid(
                "breathing_pattern",
                format!("unknown pattern '{s}'"),
            )),
        }
    }
}

/// Something the user can pick on a timer screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    Fasting(FastingProtocol),
    Meditation {
        minutes: u64,
        breathing: Option<BreathingPattern>,
    },
}

impl Protocol {
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] for a zero-minute
    /// meditation.
    pub fn to_config(&self) -> Result<SessionConfig, TimerError> {
        match self {
            Protocol::Fasting(fast) => SessionConfig::new(fast.fasting_secs(), None),
            Protocol::Meditation { minutes, breathing } => {
                let total = minutes.saturating_mul(60);
                match breathing {
                    Some(pattern) => SessionConfig::with_cycle(total, pattern.cycle()?),
                    None => SessionConfig::new(total, None),
                }
            }
        }
    }

    /// Short label stored with history rows.
    pub fn label(&self) -> String {
        match self {
            Protocol::Fasting(fast) => format!("fast {fast}"),
            Protocol::Meditation {
                minutes,
                breathing: Some(pattern),
            } => format!("meditate {minutes}m {pattern}"),
            Protocol::Meditation {
                minutes,
                breathing: None,
            } => format!("meditate {minutes}m"),
        }
    }

    pub fn kind(&self) -> ProtocolKind {
        match self {
            Protocol::Fasting(_) => ProtocolKind::Fasting,
            Protocol::Meditation { .. } => ProtocolKind::Meditation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Fasting,
    Meditation,
    Breathing,
    /// Ad-hoc duration and phases entered by hand.
    Custom,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolKind::Fasting => "fasting",
            ProtocolKind::Meditation => "meditation",
            ProtocolKind::Breathing => "breathing",
            ProtocolKind::Custom => "custom",
        })
    }
}

impl FromStr for ProtocolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fasting" => Ok(ProtocolKind::Fasting),
            "meditation" => Ok(ProtocolKind::Meditation),
            "breathing" => Ok(ProtocolKind::Breathing),
            "custom" => Ok(ProtocolKind::Custom),
            other => Err(format!("unknown protocol kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub kind: ProtocolKind,
    pub summary: String,
}

impl Searchable for CatalogEntry {
    fn search_text(&self) -> String {
        format!("{} {} {} {}", self.id, self.title, self.kind, self.summary)
    }
}

/// Standard meditation lengths offered alongside the breathing patterns.
pub const MEDITATION_MINUTES: [u64; 4] = [5, 10, 15, 20];

/// Every preset, in display order.
pub fn catalog() -> Vec<CatalogEntry> {
    let fasts = FastingProtocol::PRESETS.iter().map(|fast| CatalogEntry {
        id: fast.to_string(),
        title: fast.title(),
        kind: ProtocolKind::Fasting,
        summary: match fast.eating_window_hours() {
            0 => format!("fast for {}", format_compact(fast.fasting_secs())),
            window => format!(
                "fast for {} with a {window}h eating window",
                format_compact(fast.fasting_secs())
            ),
        },
    });
    let breaths = BreathingPattern::ALL.iter().map(|pattern| {
        let phases = pattern.phases();
        let steps = phases
            .iter()
            .map(|p| format!("{} {}s", p.name, p.duration_secs))
            .collect::<Vec<_>>()
            .join(", ");
        CatalogEntry {
            id: pattern.to_string(),
            title: pattern.title().to_string(),
            kind: ProtocolKind::Breathing,
            summary: steps,
        }
    });
    let meditations = MEDITATION_MINUTES.iter().map(|minutes| CatalogEntry {
        id: format!("meditate:{minutes}"),
        title: format!("{minutes} minute meditation"),
        kind: ProtocolKind::Meditation,
        summary: format!("quiet countdown of {}", format_compact(minutes * 60)),
    });
    fasts.chain(breaths).chain(meditations).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fasting_protocols() {
        assert_eq!("16:8".parse::<FastingProtocol>().unwrap(), FastingProtocol::Lean);
        assert_eq!("OMAD".parse::<FastingProtocol>().unwrap(), FastingProtocol::Omad);
        assert_eq!(
            "custom:14".parse::<FastingProtocol>().unwrap(),
            FastingProtocol::Custom { fasting_hours: 14 }
        );
        assert!("custom:0".parse::<FastingProtocol>().is_err());
        assert!("custom:100".parse::<FastingProtocol>().is_err());
        assert!("12:12".parse::<FastingProtocol>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for fast in FastingProtocol::PRESETS {
            assert_eq!(fast.to_string().parse::<FastingProtocol>().unwrap(), fast);
        }
        for pattern in BreathingPattern::ALL {
            assert_eq!(pattern.to_string().parse::<BreathingPattern>().unwrap(), pattern);
        }
    }

    #[test]
    fn sixteen_eight_is_sixteen_hours() {
        let cfg = Protocol::Fasting(FastingProtocol::Lean).to_config().unwrap();
        assert_eq!(cfg.total_duration_secs(), 16 * 3600);
        assert!(cfg.phase_cycle().is_none());
        assert_eq!(FastingProtocol::Lean.eating_window_hours(), 8);
        assert_eq!(FastingProtocol::Extended36.eating_window_hours(), 0);
    }

    #[test]
    fn meditation_with_breathing_has_cycle() {
        let protocol = Protocol::Meditation {
            minutes: 10,
            breathing: Some(BreathingPattern::FourSevenEight),
        };
        let cfg = protocol.to_config().unwrap();
        assert_eq!(cfg.total_duration_secs(), 600);
        let cycle = cfg.phase_cycle().unwrap();
        assert_eq!(cycle.cycle_duration_secs(), 19);
        assert_eq!(protocol.label(), "meditate 10m 4-7-8");
    }

    #[test]
    fn zero_minute_meditation_rejected() {
        let protocol = Protocol::Meditation {
            minutes: 0,
            breathing: None,
        };
        assert!(matches!(
            protocol.to_config(),
            Err(TimerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn every_breathing_pattern_is_a_valid_cycle() {
        for pattern in BreathingPattern::ALL {
            assert!(pattern.cycle().is_ok(), "{pattern}");
        }
    }

    #[test]
    fn catalog_lists_all_presets() {
        let entries = catalog();
        assert_eq!(
            entries.len(),
            FastingProtocol::PRESETS.len() + BreathingPattern::ALL.len() + MEDITATION_MINUTES.len()
        );
        let lean = entries.iter().find(|e| e.id == "16:8").unwrap();
        assert_eq!(lean.summary, "fast for 16h with a 8h eating window");
        let boxed = entries.iter().find(|e| e.id == "box").unwrap();
        assert_eq!(boxed.kind, ProtocolKind::Breathing);
    }
}
