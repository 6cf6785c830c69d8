use chrono::{DateTime, Utc};
use serde::Serialize;

/// MH-Z19 output range. Values outside it are warm-up or fault noise.
pub const PLAUSIBLE_MIN: u16 = 410;
pub const PLAUSIBLE_MAX: u16 = 6000;

const FRAME_LEN: usize = 9;
const START_BYTE: u8 = 0xff;
const CMD_READ_CONCENTRATION: u8 = 0x86;

#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub co2_ppm: u16,
}

impl Reading {
    pub fn from_frame(data: &[u8]) -> Option<Self> {
        if data.len() != FRAME_LEN {
            return None;
        }
        if data[0] != START_BYTE || data[1] != CMD_READ_CONCENTRATION {
            return None;
        }
        if data[8] != checksum(data) {
            return None;
        }

        let co2_ppm = u16::from_be_bytes([data[2], data[3]]);

        Some(Self {
            timestamp: Utc::now(),
            co2_ppm,
        })
    }

    pub fn is_plausible(&self) -> bool {
        (PLAUSIBLE_MIN..=PLAUSIBLE_MAX).contains(&self.co2_ppm)
    }

    pub fn level(&self) -> VentilationLevel {
        VentilationLevel::from_ppm(self.co2_ppm)
    }
}

/// Datasheet checksum: 0xFF - sum(bytes 1..=7) + 1.
fn checksum(frame: &[u8]) -> u8 {
    let sum = frame[1..8].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VentilationLevel {
    Waiting,
    Excess,
    Good,
    Notice,
    Caution,
    Warning,
    Danger,
}

impl VentilationLevel {
    /// Thresholds follow published indoor-air-quality guidance; readings
    /// above the sensor's range fall back to Waiting, same as warm-up.
    pub fn from_ppm(ppm: u16) -> Self {
        if ppm <= 410 {
            VentilationLevel::Waiting
        } else if ppm <= 450 {
            VentilationLevel::Excess
        } else if ppm <= 700 {
            VentilationLevel::Good
        } else if ppm <= 1000 {
            VentilationLevel::Notice
        } else if ppm <= 1500 {
            VentilationLevel::Caution
        } else if ppm <= 5000 {
            VentilationLevel::Warning
        } else if ppm <= 6000 {
            VentilationLevel::Danger
        } else {
            VentilationLevel::Waiting
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VentilationLevel::Waiting => "Waiting...",
            VentilationLevel::Excess => "Excess",
            VentilationLevel::Good => "Good",
            VentilationLevel::Notice => "Notice",
            VentilationLevel::Caution => "Caution",
            VentilationLevel::Warning => "Warning",
            VentilationLevel::Danger => "Danger",
        }
    }
}

impl std::fmt::Display for VentilationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(high: u8, low: u8) -> [u8; 9] {
        let mut f = [START_BYTE, CMD_READ_CONCENTRATION, high, low, 0, 0, 0, 0, 0];
        f[8] = checksum(&f);
        f
    }

    #[test]
    fn decodes_concentration_from_frame() {
        let reading = Reading::from_frame(&frame(0x01, 0x2c)).unwrap();
        assert_eq!(reading.co2_ppm, 300);
    }

    #[test]
    fn documented_checksum_matches() {
        // The datasheet's read command carries 0x79 as its own checksum.
        let cmd = [0xff, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x79];
        assert_eq!(checksum(&cmd), 0x79);
    }

    #[test]
    fn rejects_corrupt_frames() {
        let mut bad_checksum = frame(0x01, 0x2c);
        bad_checksum[8] ^= 0xff;
        assert!(Reading::from_frame(&bad_checksum).is_none());

        let mut bad_start = frame(0x01, 0x2c);
        bad_start[0] = 0x00;
        assert!(Reading::from_frame(&bad_start).is_none());

        assert!(Reading::from_frame(&frame(0x01, 0x2c)[..8]).is_none());
    }

    #[test]
    fn classifies_threshold_boundaries() {
        let cases = [
            (0, VentilationLevel::Waiting),
            (410, VentilationLevel::Waiting),
            (411, VentilationLevel::Excess),
            (450, VentilationLevel::Excess),
            (451, VentilationLevel::Good),
            (700, VentilationLevel::Good),
            (701, VentilationLevel::Notice),
            (1000, VentilationLevel::Notice),
            (1001, VentilationLevel::Caution),
            (1500, VentilationLevel::Caution),
            (1501, VentilationLevel::Warning),
            (5000, VentilationLevel::Warning),
            (5001, VentilationLevel::Danger),
            (6000, VentilationLevel::Danger),
            (6001, VentilationLevel::Waiting),
        ];
        for (ppm, expected) in cases {
            assert_eq!(VentilationLevel::from_ppm(ppm), expected, "at {} ppm", ppm);
        }
    }

    #[test]
    fn plausibility_band_is_inclusive() {
        let at = |ppm| Reading {
            timestamp: Utc::now(),
            co2_ppm: ppm,
        };
        assert!(!at(409).is_plausible());
        assert!(at(410).is_plausible());
        assert!(at(6000).is_plausible());
        assert!(!at(6001).is_plausible());
    }

    #[test]
    fn waiting_label_matches_screen_text() {
        assert_eq!(VentilationLevel::Waiting.label(), "Waiting...");
        assert_eq!(VentilationLevel::Danger.to_string(), "Danger");
    }
}
