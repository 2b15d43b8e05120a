use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Fixed focus session configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusMode {
    #[default]
    QuickSprint,
    DeepWork,
    Marathon,
}

/// Static row of the mode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub duration_secs: u64,
    pub xp_reward: u32,
}

const QUICK_SPRINT: ModeSpec = ModeSpec {
    id: "quick-sprint",
    label: "Quick Sprint",
    duration_secs: 25 * 60,
    xp_reward: 50,
};

const DEEP_WORK: ModeSpec = ModeSpec {
    id: "deep-work",
    label: "Deep Work",
    duration_secs: 50 * 60,
    xp_reward: 120,
};

const MARATHON: ModeSpec = ModeSpec {
    id: "marathon",
    label: "Marathon",
    duration_secs: 90 * 60,
    xp_reward: 250,
};

impl FocusMode {
    pub const ALL: [FocusMode; 3] = [FocusMode::QuickSprint, FocusMode::DeepWork, FocusMode::Marathon];

    pub fn spec(self) -> &'static ModeSpec {
        match self {
            FocusMode::QuickSprint => &QUICK_SPRINT,
            FocusMode::DeepWork => &DEEP_WORK,
            FocusMode::Marathon => &MARATHON,
        }
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }

    pub fn duration_secs(self) -> u64 {
        self.spec().duration_secs
    }

    pub fn xp_reward(self) -> u32 {
        self.spec().xp_reward
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FocusMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        FocusMode::ALL
            .into_iter()
            .find(|m| m.id() == needle)
            .ok_or_else(|| CoreError::UnknownMode(s.to_string()))
    }
}
