//! Delay placement profiles
//!
//! Each cycle has three points where the loop may pause. A profile says which
//! of them are active and how the delay budget is split between them.

use serde::{Deserialize, Serialize};

/// A point in the cycle where a delay may be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checkpoint {
    PreRead = 0,
    MidCycle = 1,
    PostWrite = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DelayProfile {
    /// read, write, delay
    #[default]
    ReadWriteDelay,
    /// delay, read, write
    DelayReadWrite,
    /// read, delay, write
    ReadDelayWrite,
    /// delay, read, delay, write
    DelayReadDelayWrite,
    /// delay, read, write, delay
    DelayReadWriteDelay,
    /// delay, read, delay, write, delay
    DelayReadDelayWriteDelay,
}

struct ProfileInfo {
    /// Indexed by `Checkpoint`
    active: [bool; 3],
    divisor: u32,
}

const PROFILES: [ProfileInfo; 6] = [
    ProfileInfo { active: [false, false, true], divisor: 1 },
    ProfileInfo { active: [true, false, false], divisor: 1 },
    ProfileInfo { active: [false, true, false], divisor: 1 },
    ProfileInfo { active: [true, true, false], divisor: 2 },
    ProfileInfo { active: [true, false, true], divisor: 2 },
    ProfileInfo { active: [true, true, true], divisor: 3 },
];

impl DelayProfile {
    pub const ALL: [DelayProfile; 6] = [
        DelayProfile::ReadWriteDelay,
        DelayProfile::DelayReadWrite,
        DelayProfile::ReadDelayWrite,
        DelayProfile::DelayReadDelayWrite,
        DelayProfile::DelayReadWriteDelay,
        DelayProfile::DelayReadDelayWriteDelay,
    ];

    /// Look up a profile by its command line mode number
    pub fn from_mode(mode: u8) -> Option<Self> {
        Self::ALL.get(mode as usize).copied()
    }

    pub fn mode(self) -> u8 {
        self as u8
    }

    fn info(self) -> &'static ProfileInfo {
        &PROFILES[self as usize]
    }

    pub fn is_active(self, checkpoint: Checkpoint) -> bool {
        self.info().active[checkpoint as usize]
    }

    /// Number of active checkpoints sharing the delay budget
    pub fn divisor(self) -> u32 {
        self.info().divisor
    }

    /// Share of `delay_us` taken at `checkpoint`, or zero if inactive
    pub fn share(self, checkpoint: Checkpoint, delay_us: i64) -> i64 {
        if !self.is_active(checkpoint) {
            return 0;
        }
        delay_us / i64::from(self.divisor())
    }

    pub fn description(self) -> &'static str {
        match self {
            DelayProfile::ReadWriteDelay => "read, write, delay",
            DelayProfile::DelayReadWrite => "delay, read, write",
            DelayProfile::ReadDelayWrite => "read, delay, write",
            DelayProfile::DelayReadDelayWrite => "delay, read, delay, write",
            DelayProfile::DelayReadWriteDelay => "delay, read, write, delay",
            DelayProfile::DelayReadDelayWriteDelay => "delay, read, delay, write, delay",
        }
    }
}
