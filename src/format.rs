//! Display adapters for console output.
//!
//! The core only deals in raw `u64` bytes. These wrappers render them at the
//! presentation boundary and honour width and alignment flags, so a column
//! is just `format!("{:>10}", Size(bytes))`.

use std::fmt;

/// Binary unit ladder; each step is 1024 times the previous one.
const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// A byte count, rendered with the largest unit that keeps the value >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size(pub u64);

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        let text = if unit == 0 {
            format!("{} {}", self.0, UNITS[0])
        } else {
            format!("{value:.1} {}", UNITS[unit])
        };
        f.pad(&text)
    }
}

/// A count with `,` between groups of three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count(pub u64);

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut text = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                text.push(',');
            }
            text.push(ch);
        }
        f.pad(&text)
    }
}

/// `part` as a whole-number percentage of `whole`. An empty whole reads as 0%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub part: u64,
    pub whole: u64,
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = match self.whole {
            0 => 0,
            whole => (u128::from(self.part) * 100 / u128::from(whole)).min(100),
        };
        f.pad(&format!("{pct}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_climb_the_unit_ladder() {
        assert_eq!(Size(0).to_string(), "0 B");
        assert_eq!(Size(1023).to_string(), "1023 B");
        assert_eq!(Size(1536).to_string(), "1.5 KiB");
        assert_eq!(Size(5 * 1024 * 1024).to_string(), "5.0 MiB");
        assert_eq!(Size(3 << 30).to_string(), "3.0 GiB");
    }

    #[test]
    fn sizes_past_the_last_unit_stay_in_tebibytes() {
        assert_eq!(Size(2048 << 40).to_string(), "2048.0 TiB");
    }

    #[test]
    fn width_flags_align_the_column() {
        assert_eq!(format!("{:>8}", Size(10)), "    10 B");
        assert_eq!(format!("{:<6}|", Count(1_000)), "1,000 |");
        assert_eq!(format!("{:>4}", Share { part: 1, whole: 4 }), " 25%");
    }

    #[test]
    fn counts_are_grouped_in_threes() {
        assert_eq!(Count(0).to_string(), "0");
        assert_eq!(Count(999).to_string(), "999");
        assert_eq!(Count(12_345).to_string(), "12,345");
        assert_eq!(Count(1_234_567).to_string(), "1,234,567");
    }

    #[test]
    fn share_of_an_empty_whole_is_zero() {
        assert_eq!(Share { part: 0, whole: 0 }.to_string(), "0%");
        assert_eq!(Share { part: u64::MAX, whole: u64::MAX }.to_string(), "100%");
    }
}
