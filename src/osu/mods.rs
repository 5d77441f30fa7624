use bitflags::bitflags;

bitflags! {
    /// Mods as a bitset, the way the osu! API v1 reports them in `enabled_mods`
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LegacyMods: u32 {
        const NO_FAIL = 1 << 0;
        const EASY = 1 << 1;
        const TOUCH_DEVICE = 1 << 2;
        const HIDDEN = 1 << 3;
        const HARD_ROCK = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME = 1 << 6;
        const RELAX = 1 << 7;
        const HALF_TIME = 1 << 8;
        const NIGHTCORE = 1 << 9;
        const FLASHLIGHT = 1 << 10;
        const AUTOPLAY = 1 << 11;
        const SPUN_OUT = 1 << 12;
        const AUTOPILOT = 1 << 13;
        const PERFECT = 1 << 14;
        const TARGET = 1 << 23;
        const SCORE_V2 = 1 << 29;
    }
}

/// Display order of osu!standard mods.  NC and PF are listed before the mods they imply.
const ACRONYMS: &[(LegacyMods, &str)] = &[
    (LegacyMods::NIGHTCORE, "NC"),
    (LegacyMods::DOUBLE_TIME, "DT"),
    (LegacyMods::PERFECT, "PF"),
    (LegacyMods::SUDDEN_DEATH, "SD"),
    (LegacyMods::AUTOPILOT, "AP"),
    (LegacyMods::AUTOPLAY, "AT"),
    (LegacyMods::EASY, "EZ"),
    (LegacyMods::FLASHLIGHT, "FL"),
    (LegacyMods::HALF_TIME, "HT"),
    (LegacyMods::HARD_ROCK, "HR"),
    (LegacyMods::HIDDEN, "HD"),
    (LegacyMods::NO_FAIL, "NF"),
    (LegacyMods::RELAX, "RX"),
    (LegacyMods::SPUN_OUT, "SO"),
    (LegacyMods::TARGET, "TP"),
    (LegacyMods::TOUCH_DEVICE, "TD"),
    (LegacyMods::SCORE_V2, "SV2"),
];

impl LegacyMods {
    /// Bits that don't apply to osu!standard (key mods, cinema, ...) are dropped.
    pub fn from_api(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }

    pub fn acronyms(self) -> Vec<&'static str> {
        let mut mods = self;

        // NC and PF always come with DT and SD set, but only the former is shown
        if mods.contains(Self::NIGHTCORE) {
            mods.remove(Self::DOUBLE_TIME);
        }
        if mods.contains(Self::PERFECT) {
            mods.remove(Self::SUDDEN_DEATH);
        }

        ACRONYMS
            .iter()
            .filter(|(flag, _)| mods.contains(*flag))
            .map(|(_, acronym)| *acronym)
            .collect()
    }

    /// `"HD, HR"`, or `"None"` without mods
    pub fn label(self) -> String {
        let acronyms = self.acronyms();

        if acronyms.is_empty() {
            "None".to_owned()
        } else {
            acronyms.join(", ")
        }
    }
}
