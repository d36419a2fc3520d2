// ── Accent pattern ────────────────────────────────────────────────────────────

/// One named accent cycle: `true` entries are accented beats.  Every variant
/// maps to a non-empty sequence, so lookups cannot fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccentPattern {
    None,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
}

impl AccentPattern {
    pub const ALL: [AccentPattern; 7] = [
        AccentPattern::None,
        AccentPattern::Two,
        AccentPattern::Three,
        AccentPattern::Four,
        AccentPattern::Five,
        AccentPattern::Six,
        AccentPattern::Seven,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::None  => "No Accent",
            Self::Two   => "2/4",
            Self::Three => "3/4",
            Self::Four  => "4/4",
            Self::Five  => "5/4",
            Self::Six   => "6/4",
            Self::Seven => "7/4",
        }
    }

    /// Accent flags for one bar, first beat first.
    pub fn beats(self) -> &'static [bool] {
        match self {
            Self::None  => &[false],
            Self::Two   => &[true, false],
            Self::Three => &[true, false, false],
            Self::Four  => &[true, false, false, false],
            Self::Five  => &[true, false, false, false, false],
            Self::Six   => &[true, false, false, false, false, false],
            Self::Seven => &[true, false, false, false, false, false, false],
        }
    }
}
