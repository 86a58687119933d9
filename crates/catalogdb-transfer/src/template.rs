use crate::UTF8_BOM;
use std::fmt;

///
/// CsvKind
///
/// One CSV file shape. Headers are the wire field names shared by import,
/// export and templates.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CsvKind {
    Operators,
    Terminals,
    Facilities,
    Advertisements,
}

impl CsvKind {
    pub const ALL: [Self; 4] = [
        Self::Operators,
        Self::Terminals,
        Self::Facilities,
        Self::Advertisements,
    ];

    #[must_use]
    pub const fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Operators => &["name", "isVerified"],
            Self::Terminals => &["operatorName", "terminalName", "city", "address", "phones"],
            Self::Facilities => &["name", "type", "city", "address", "phones", "isVerified"],
            Self::Advertisements => &[
                "title",
                "description",
                "contact",
                "address",
                "map",
                "image",
                "website",
                "facebook",
                "telegram",
                "tiktok",
                "isEnabled",
                "isVerified",
            ],
        }
    }

    /// Ordered field exports are sorted by.
    #[must_use]
    pub const fn export_order(self) -> &'static str {
        match self {
            Self::Operators | Self::Facilities => "nameLower",
            Self::Terminals => "operatorNameLower",
            Self::Advertisements => "title",
        }
    }

    /// Suggested file stem for downloads.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Operators => "operators",
            Self::Terminals => "terminals",
            Self::Facilities => "medical_facilities",
            Self::Advertisements => "custom_ads",
        }
    }

    const fn example_row(self) -> &'static str {
        match self {
            Self::Operators => "Shwe Mandalar,TRUE",
            Self::Terminals => "Shwe Mandalar,Aung Mingalar,Yangon,\"Room 1, Aung Mingalar Highway Station\",09-123",
            Self::Facilities => "Asia Royal,private_hospital,Yangon,\"14 Baho Road, Sanchaung\",09-123,TRUE",
            Self::Advertisements => {
                "Golden Tours,Daily trips,\"09-111,09-222\",Yangon,,,,,,,TRUE,FALSE"
            }
        }
    }
}

impl fmt::Display for CsvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Header line plus one example row, BOM-prefixed, ready to save as a file.
#[must_use]
pub fn template(kind: CsvKind) -> String {
    format!("{UTF8_BOM}{}\n{}\n", kind.headers().join(","), kind.example_row())
}
