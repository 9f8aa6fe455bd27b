//! Print quality and cut settings accepted by the printer.

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

/// Print quality. Each mode maps to a fixed wire name, speed, and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    /// Slow, high resolution, saturated colors.
    #[default]
    Vivid,
    /// Faster, lower resolution.
    Normal,
}

impl PrintMode {
    /// The mode name as the printer knows it.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PrintMode::Vivid => "vivid",
            PrintMode::Normal => "color",
        }
    }

    /// The `<speed>` value.
    pub fn speed(&self) -> u32 {
        match self {
            PrintMode::Vivid => 0,
            PrintMode::Normal => 1,
        }
    }

    /// Lines per inch.
    pub fn lpi(&self) -> u32 {
        match self {
            PrintMode::Vivid => 317,
            PrintMode::Normal => 264,
        }
    }
}

/// What happens to the tape once a label is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CutMode {
    /// Leave the tape uncut.
    None,
    /// Score the tape so the user can slide to cut.
    Half,
    /// Cut the label off completely.
    #[default]
    Full,
}
