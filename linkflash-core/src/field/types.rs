//! Field type definitions
//!
//! The fixed set of header fields the tool edits, plus the typed values
//! behind the two non-scalar fields (link identifier and TX rate).

use core::fmt;
use core::str::FromStr;

use heapless::Vec;

/// Number of bytes in a link identifier (BSSID)
pub const LINK_ID_LEN: usize = 6;

/// Link identifier shown when the header has none
pub const DEFAULT_LINK_ID: &str = "AA:BB:CC:DD:EE:FF";

/// UART baud rates offered by the front end
pub const BAUD_RATES: [&str; 4] = ["115200", "230400", "460800", "921600"];

/// How a field's value is spelled inside the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single token, e.g. `11`
    Scalar,
    /// Brace-delimited hex byte literals, e.g. `{0xAA, 0xBB}`
    ByteList,
    /// Symbolic constant mapped to a display label, e.g. `PHY_RATE_1M_L`
    Symbol,
}

/// Acceptance rule for a field's display value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Decimal integer in an inclusive range
    Range { min: u32, max: u32 },
    /// Six colon-separated two-digit hex groups
    LinkId,
    /// One of a fixed option list (enforced by the front end)
    OneOf(&'static [&'static str]),
}

/// Fields editable from the form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Channel,
    LinkId,
    TxRate,
    BaudRate,
    PacketSize,
}

/// Static description of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// C macro name
    pub symbol: &'static str,
    /// Value spelling
    pub kind: FieldKind,
    /// Form label
    pub label: &'static str,
    /// Short hint shown beside the input
    pub hint: &'static str,
    /// Acceptance rule
    pub constraint: Constraint,
}

const TX_RATE_LABELS: [&str; 4] = [
    TxRate::OneM.label(),
    TxRate::TwoM.label(),
    TxRate::FiveHalfM.label(),
    TxRate::ElevenM.label(),
];

impl Field {
    /// All fields in form order
    pub const ALL: [Field; 5] = [
        Field::Channel,
        Field::LinkId,
        Field::TxRate,
        Field::BaudRate,
        Field::PacketSize,
    ];

    /// Field definition
    pub const fn def(self) -> FieldDef {
        match self {
            Field::Channel => FieldDef {
                symbol: "WIFI_DEFAULT_CHANNEL",
                kind: FieldKind::Scalar,
                label: "WiFi Channel",
                hint: "1-14, match both ends",
                constraint: Constraint::Range { min: 1, max: 14 },
            },
            Field::LinkId => FieldDef {
                symbol: "CUSTOM_BSSID",
                kind: FieldKind::ByteList,
                label: "Link ID (BSSID)",
                hint: "unique per plane",
                constraint: Constraint::LinkId,
            },
            Field::TxRate => FieldDef {
                symbol: "WIFI_TX_RATE",
                kind: FieldKind::Symbol,
                label: "TX Rate",
                hint: "lower = more range",
                constraint: Constraint::OneOf(&TX_RATE_LABELS),
            },
            Field::BaudRate => FieldDef {
                symbol: "UART_BAUD_RATE",
                kind: FieldKind::Scalar,
                label: "Baud Rate",
                hint: "match RP2040",
                constraint: Constraint::OneOf(&BAUD_RATES),
            },
            Field::PacketSize => FieldDef {
                symbol: "MAX_PACKET_SIZE",
                kind: FieldKind::Scalar,
                label: "Max Packet Size",
                hint: "16-256 bytes",
                constraint: Constraint::Range { min: 16, max: 256 },
            },
        }
    }

    /// C macro name
    pub const fn symbol(self) -> &'static str {
        self.def().symbol
    }

    /// Value spelling
    pub const fn kind(self) -> FieldKind {
        self.def().kind
    }

    /// Form label
    pub const fn label(self) -> &'static str {
        self.def().label
    }

    /// Short usage hint shown beside the input
    pub const fn hint(self) -> &'static str {
        self.def().hint
    }

    /// Display value used when the header lacks this field
    pub fn default_display(self) -> &'static str {
        match self {
            Field::LinkId => DEFAULT_LINK_ID,
            Field::TxRate => TxRate::default().label(),
            Field::Channel | Field::BaudRate | Field::PacketSize => "",
        }
    }

    /// Options offered by the front end, if the field is a fixed choice
    pub fn options(self) -> Option<&'static [&'static str]> {
        match self.def().constraint {
            Constraint::OneOf(options) => Some(options),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Radio over-the-air modulation rate
///
/// Lower rates trade throughput for range. The order of [`TxRate::ALL`]
/// is the order offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxRate {
    #[default]
    OneM,
    TwoM,
    FiveHalfM,
    ElevenM,
}

impl TxRate {
    /// All rates, slowest first
    pub const ALL: [TxRate; 4] = [
        TxRate::OneM,
        TxRate::TwoM,
        TxRate::FiveHalfM,
        TxRate::ElevenM,
    ];

    /// SDK constant name
    pub const fn symbol(self) -> &'static str {
        match self {
            TxRate::OneM => "PHY_RATE_1M_L",
            TxRate::TwoM => "PHY_RATE_2M_L",
            TxRate::FiveHalfM => "PHY_RATE_5M_S",
            TxRate::ElevenM => "PHY_RATE_11M_S",
        }
    }

    /// Human-readable label
    pub const fn label(self) -> &'static str {
        match self {
            TxRate::OneM => "1M  (max range)",
            TxRate::TwoM => "2M  (good range)",
            TxRate::FiveHalfM => "5.5M (balanced)",
            TxRate::ElevenM => "11M (short range)",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.symbol() == symbol)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

/// Why a link identifier string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkIdError {
    /// Not six colon-separated groups of two characters
    Format,
    /// A group is not a hex byte
    InvalidHex,
}

/// Six-byte link identifier distinguishing one transmitter/receiver pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub [u8; LINK_ID_LEN]);

impl LinkId {
    pub fn bytes(&self) -> [u8; LINK_ID_LEN] {
        self.0
    }

    /// Parse the inside of a brace list, e.g. `0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF`
    ///
    /// Literals may omit the `0x` prefix; each is read as hex.
    pub fn from_literals(list: &str) -> Option<Self> {
        let mut bytes: Vec<u8, LINK_ID_LEN> = Vec::new();
        for literal in list.split(',') {
            // Line continuations count as whitespace
            let literal = literal.trim_matches(|c: char| c.is_whitespace() || c == '\\');
            let digits = literal
                .strip_prefix("0x")
                .or_else(|| literal.strip_prefix("0X"))
                .unwrap_or(literal);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let byte = u8::from_str_radix(digits, 16).ok()?;
            bytes.push(byte).ok()?;
        }
        let bytes: [u8; LINK_ID_LEN] = bytes.into_array().ok()?;
        Some(Self(bytes))
    }

    /// Brace list spelling used in the header
    pub fn to_literals(&self) -> String {
        let literals: std::vec::Vec<String> =
            self.0.iter().map(|b| format!("0x{:02X}", b)).collect();
        format!("{{{}}}", literals.join(", "))
    }
}

impl FromStr for LinkId {
    type Err = LinkIdError;

    /// Parse the display form `AA:BB:CC:DD:EE:FF` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut groups: Vec<&str, LINK_ID_LEN> = Vec::new();
        for group in s.split(':') {
            if group.len() != 2 {
                return Err(LinkIdError::Format);
            }
            groups.push(group).map_err(|_| LinkIdError::Format)?;
        }
        if groups.len() != LINK_ID_LEN {
            return Err(LinkIdError::Format);
        }

        let mut bytes = [0u8; LINK_ID_LEN];
        for (byte, group) in bytes.iter_mut().zip(groups.iter()) {
            if !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(LinkIdError::InvalidHex);
            }
            *byte = u8::from_str_radix(group, 16).map_err(|_| LinkIdError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_symbols_unique() {
        for a in Field::ALL {
            for b in Field::ALL {
                if a != b {
                    assert_ne!(a.symbol(), b.symbol());
                }
            }
        }
    }

    #[test]
    fn test_tx_rate_table() {
        assert_eq!(TxRate::from_symbol("PHY_RATE_5M_S"), Some(TxRate::FiveHalfM));
        assert_eq!(TxRate::from_label("11M (short range)"), Some(TxRate::ElevenM));
        assert_eq!(TxRate::from_label("11M"), None);
        assert_eq!(TxRate::default().label(), "1M  (max range)");
        assert_eq!(Field::TxRate.options().map(|o| o.len()), Some(4));
    }

    #[test]
    fn test_link_id_display_roundtrip() {
        let id: LinkId = "aa:bb:cc:dd:ee:0f".parse().unwrap();
        assert_eq!(id.bytes(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x0F]);
        assert_eq!(id.to_string(), "AA:BB:CC:DD:EE:0F");
    }

    #[test]
    fn test_link_id_rejects_bad_shapes() {
        assert_eq!("AA:BB:CC:DD:EE".parse::<LinkId>(), Err(LinkIdError::Format));
        assert_eq!("AA:BB:CC:DD:EE:FF:00".parse::<LinkId>(), Err(LinkIdError::Format));
        assert_eq!("AAB:B:CC:DD:EE:FF".parse::<LinkId>(), Err(LinkIdError::Format));
        assert_eq!("GG:BB:CC:DD:EE:FF".parse::<LinkId>(), Err(LinkIdError::InvalidHex));
        assert_eq!("+A:BB:CC:DD:EE:FF".parse::<LinkId>(), Err(LinkIdError::InvalidHex));
    }

    #[test]
    fn test_link_id_literals() {
        let id = LinkId::from_literals("0x01, 0x02,0x03 , 0X04, 05, 0x06").unwrap();
        assert_eq!(id.bytes(), [1, 2, 3, 4, 5, 6]);
        let continued =
            LinkId::from_literals("0x01, 0x02, 0x03, \\\r\n  0x04, 0x05, 0x06").unwrap();
        assert_eq!(continued, id);
        assert_eq!(id.to_literals(), "{0x01, 0x02, 0x03, 0x04, 0x05, 0x06}");

        assert!(LinkId::from_literals("0x01, 0x02").is_none());
        assert!(LinkId::from_literals("0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07").is_none());
        assert!(LinkId::from_literals("0x01, 0x02, 0x03, 0x04, 0x05, 0xZZ").is_none());
        assert!(LinkId::from_literals("0x01, 0x02, 0x03, 0x04, 0x05, 0x100").is_none());
    }
}
