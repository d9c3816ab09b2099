//! Fixed-byte format signatures and the sliding-window matcher.

use std::fmt;

/// Beacon family a signature identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Family {
    Pebblebee,
    #[value(name = "ruuvitag", alias = "ruuvi")]
    RuuviTag,
    #[value(name = "uribeacon", alias = "uri")]
    UriBeacon,
}

impl Family {
    /// Classification order used unless configured otherwise.
    pub const DEFAULT_PRIORITY: [Family; 3] =
        [Family::Pebblebee, Family::RuuviTag, Family::UriBeacon];
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Pebblebee => write!(f, "pebblebee"),
            Family::RuuviTag => write!(f, "ruuvitag"),
            Family::UriBeacon => write!(f, "uribeacon"),
        }
    }
}

/// Where a signature is allowed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Anywhere,
    At(usize),
}

/// How the UriBeacon service-presence signature is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UriAnchor {
    /// Only at index 14, directly after the report header
    #[default]
    Fixed,
    /// Anywhere in the packet
    Scan,
}

/// An immutable byte pattern identifying one beacon family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSignature {
    pub family: Family,
    pub pattern: &'static [u8],
    pub anchor: Anchor,
}

/// Start index of the UriBeacon service UUID list in a packet without flags.
pub const URI_SERVICE_INDEX: usize = 14;

/// Appearance "generic tag", TX power level and manufacturer data header.
pub const PEBBLEBEE: FormatSignature = FormatSignature {
    family: Family::Pebblebee,
    pattern: &[0x19, 0x00, 0x02, 0x02, 0x0A, 0x06, 0x09, 0xFF],
    anchor: Anchor::Anywhere,
};

/// ASCII `ruu.vi/#`
pub const RUUVITAG: FormatSignature = FormatSignature {
    family: Family::RuuviTag,
    pattern: b"ruu.vi/#",
    anchor: Anchor::Anywhere,
};

/// Complete list of 16-bit service UUIDs containing 0xFED8.
pub const URIBEACON_SERVICE: FormatSignature = FormatSignature {
    family: Family::UriBeacon,
    pattern: &[0x03, 0x03, 0xD8, 0xFE],
    anchor: Anchor::At(URI_SERVICE_INDEX),
};

/// All registered signatures.
pub const SIGNATURES: &[FormatSignature] = &[PEBBLEBEE, RUUVITAG, URIBEACON_SERVICE];

/// A signature found in a byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub family: Family,
    pub start: usize,
    pub len: usize,
}

impl Match {
    /// Index just past the matched window.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

impl FormatSignature {
    fn matches_at(&self, bytes: &[u8], start: usize) -> bool {
        bytes
            .get(start..start + self.pattern.len())
            .is_some_and(|window| window == self.pattern)
    }

    fn anchor_with(&self, uri_anchor: UriAnchor) -> Anchor {
        match (self.family, uri_anchor) {
            (Family::UriBeacon, UriAnchor::Scan) => Anchor::Anywhere,
            _ => self.anchor,
        }
    }
}

/// Scan `bytes` for every occurrence of every signature.
///
/// Results are ordered by start index; signatures matching at the same index
/// keep their registry order.
pub fn find_matches(
    bytes: &[u8],
    signatures: &[FormatSignature],
    uri_anchor: UriAnchor,
) -> Vec<Match> {
    let mut matches = Vec::new();
    for start in 0..bytes.len() {
        for signature in signatures {
            let allowed = match signature.anchor_with(uri_anchor) {
                Anchor::Anywhere => true,
                Anchor::At(index) => index == start,
            };
            if allowed && signature.matches_at(bytes, start) {
                matches.push(Match {
                    family: signature.family,
                    start,
                    len: signature.pattern.len(),
                });
            }
        }
    }
    matches
}

/// Pick the highest-priority family among `matches`.
///
/// `None` means the record is Unknown.
pub fn classify(matches: &[Match], priority: &[Family]) -> Option<Family> {
    priority
        .iter()
        .copied()
        .find(|family| matches.iter().any(|m| m.family == *family))
}
