use serde::{Deserialize, Serialize};

/// Consecutive underruns before the sustained-underrun warning fires
pub const UNDERRUN_WARN_MAX: u32 = 100;

/// Run length before a buffer resize when the delay is adaptive
pub const RUN_THRESHOLD_DEFAULT: u32 = 10;

/// Run length before a buffer resize when the delay is constant
pub const RUN_THRESHOLD_CONST_DELAY: u32 = 1;

pub const ADJUST_SHIFT_DEFAULT: u32 = 3;
pub const ADJUST_SHIFT_MAX: u32 = 16;

/// How the delay budget and buffer size are corrected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlLaw {
    /// Exponential steps of `value >> shift`
    Shift(u32),
    /// Solve for the delay that restores the ideal schedule; resize in
    /// proportion to the rate deficit
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Grow,
    Shrink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentPolicy {
    /// 0 selects the direct law
    pub adjust_shift: u32,
    /// Expand the buffer on sustained underrun
    pub grow_on_underrun: bool,
    /// Shrink the buffer on sustained overrun
    pub shrink_on_overrun: bool,
    /// Underrun run length before growing (None: default for the delay mode)
    pub underrun_threshold: Option<u32>,
    /// Overrun run length before shrinking (None: default for the delay mode)
    pub overrun_threshold: Option<u32>,
    pub warn_on_underrun: bool,
    pub warn_threshold: u32,
    /// Fixed delay in microseconds replacing the adaptive law
    pub const_delay_us: Option<u64>,
}

impl Default for AdjustmentPolicy {
    fn default() -> Self {
        Self {
            adjust_shift: ADJUST_SHIFT_DEFAULT,
            grow_on_underrun: false,
            shrink_on_overrun: false,
            underrun_threshold: None,
            overrun_threshold: None,
            warn_on_underrun: false,
            warn_threshold: UNDERRUN_WARN_MAX,
            const_delay_us: None,
        }
    }
}

impl AdjustmentPolicy {
    pub fn law(&self) -> ControlLaw {
        match self.adjust_shift {
            0 => ControlLaw::Direct,
            shift => ControlLaw::Shift(shift),
        }
    }

    fn default_threshold(&self) -> u32 {
        if self.const_delay_us.is_some() {
            RUN_THRESHOLD_CONST_DELAY
        } else {
            RUN_THRESHOLD_DEFAULT
        }
    }

    pub fn underrun_threshold(&self) -> u32 {
        self.underrun_threshold
            .unwrap_or_else(|| self.default_threshold())
            .max(1)
    }

    pub fn overrun_threshold(&self) -> u32 {
        self.overrun_threshold
            .unwrap_or_else(|| self.default_threshold())
            .max(1)
    }

    pub fn threshold(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Grow => self.underrun_threshold(),
            Direction::Shrink => self.overrun_threshold(),
        }
    }
}
