//! Station identifiers.
//!
//! The FDSN Source Identifier uses the format `FDSN:NET_STA_LOC_BAND_SOURCE_SS`
//! where the channel code (e.g. "BHZ") is split into band ("B"), source ("H"),
//! and subsource ("Z") components. Callers may also hand in the dotted SEED
//! form `NET.STA.LOC.CHA`, which is converted on parse. Any other text is
//! kept as given.

use std::fmt;

/// Largest station id accepted from a caller, in bytes.
///
/// Matches the 64-byte SID buffer of libmseed minus its terminator.
pub const MAX_SID_LEN: usize = 63;

/// FDSN Source Identifier.
///
/// # Examples
///
/// ```
/// use mseed_pack::SourceId;
///
/// let sid = SourceId::from_nslc("IU", "ANMO", "00", "BHZ");
/// assert_eq!(sid.as_str(), "FDSN:IU_ANMO_00_B_H_Z");
/// assert_eq!(SourceId::parse("IU.ANMO.00.BHZ"), sid);
/// assert_eq!(sid.channel(), "BHZ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceId {
    raw: String,
}

impl SourceId {
    /// Parse a station identifier.
    ///
    /// Dotted `NET.STA.LOC.CHA` is converted to the `FDSN:` form; anything
    /// else, prefixed or bare, is kept verbatim.
    pub fn parse(s: &str) -> Self {
        if !s.starts_with("FDSN:") && s.contains('.') {
            let mut parts = s.splitn(4, '.');
            let network = parts.next().unwrap_or("");
            let station = parts.next().unwrap_or("");
            let location = parts.next().unwrap_or("");
            let channel = parts.next().unwrap_or("");
            return Self::from_nslc(network, station, location, channel);
        }
        Self { raw: s.to_string() }
    }

    /// Create a source identifier from NSLC codes.
    ///
    /// A 3-character channel code is split into band, source and subsource.
    pub fn from_nslc(network: &str, station: &str, location: &str, channel: &str) -> Self {
        let (band, source, subsource) = split_channel(channel);
        Self {
            raw: format!("FDSN:{network}_{station}_{location}_{band}_{source}_{subsource}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn network(&self) -> &str {
        self.component(0)
    }

    pub fn station(&self) -> &str {
        self.component(1)
    }

    pub fn location(&self) -> &str {
        self.component(2)
    }

    /// Reconstructed channel code (band + source + subsource).
    pub fn channel(&self) -> String {
        let band = self.component(3);
        let source = self.component(4);
        let subsource = self.component(5);
        format!("{band}{source}{subsource}")
    }

    /// Extract the NSLC tuple: (network, station, location, channel).
    pub fn to_nslc(&self) -> (String, String, String, String) {
        (
            self.network().to_string(),
            self.station().to_string(),
            self.location().to_string(),
            self.channel(),
        )
    }

    fn component(&self, index: usize) -> &str {
        let body = self.raw.strip_prefix("FDSN:").unwrap_or(&self.raw);
        body.split('_').nth(index).unwrap_or("")
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Split a channel code into (band, source, subsource) on char boundaries.
fn split_channel(channel: &str) -> (&str, &str, &str) {
    let mut bounds = channel.char_indices().map(|(i, _)| i).skip(1);
    let first = bounds.next().unwrap_or(channel.len());
    let second = bounds.next().unwrap_or(channel.len());
    (
        &channel[..first],
        &channel[first..second],
        &channel[second..],
    )
}
