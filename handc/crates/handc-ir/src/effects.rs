//! The closed effect and capability universes.
//!
//! Both sets are part of the IR data model. The effect→capability
//! mapping is a total function; there are no synonyms in either set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named runtime permission from the closed set of eight.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Capability {
    // Declaration order matches canonical name order, so the derived
    // Ord sorts capability lists the way the IR contract requires.
    #[serde(rename = "compute")]
    Compute,
    #[serde(rename = "crypto")]
    Crypto,
    #[serde(rename = "env")]
    Env,
    #[serde(rename = "fs.read")]
    FsRead,
    #[serde(rename = "fs.write")]
    FsWrite,
    #[serde(rename = "io.read")]
    IoRead,
    #[serde(rename = "io.write")]
    IoWrite,
    #[serde(rename = "net")]
    Net,
}

impl Capability {
    /// Every capability, in canonical (sorted) order.
    pub const ALL: [Capability; 8] = [
        Capability::Compute,
        Capability::Crypto,
        Capability::Env,
        Capability::FsRead,
        Capability::FsWrite,
        Capability::IoRead,
        Capability::IoWrite,
        Capability::Net,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Compute => "compute",
            Capability::IoRead => "io.read",
            Capability::IoWrite => "io.write",
            Capability::FsRead => "fs.read",
            Capability::FsWrite => "fs.write",
            Capability::Net => "net",
            Capability::Env => "env",
            Capability::Crypto => "crypto",
        }
    }

    /// Parse a canonical capability name. Shorthands and synonyms are
    /// not accepted here; see [`canonicalize_caps`].
    pub fn parse(name: &str) -> Option<Capability> {
        Some(match name {
            "compute" => Capability::Compute,
            "io.read" => Capability::IoRead,
            "io.write" => Capability::IoWrite,
            "fs.read" => Capability::FsRead,
            "fs.write" => Capability::FsWrite,
            "net" => Capability::Net,
            "env" => Capability::Env,
            "crypto" => Capability::Crypto,
            _ => return None,
        })
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named observable action a statement may perform.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Effect {
    #[serde(rename = "io.show")]
    IoShow,
    #[serde(rename = "io.ask")]
    IoAsk,
    #[serde(rename = "contract.verify")]
    ContractVerify,
    #[serde(rename = "control.return")]
    ControlReturn,
    #[serde(rename = "fs.read")]
    FsRead,
    #[serde(rename = "fs.write")]
    FsWrite,
    #[serde(rename = "net.request")]
    NetRequest,
    #[serde(rename = "env.read")]
    EnvRead,
    #[serde(rename = "crypto.use")]
    CryptoUse,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::IoShow => "io.show",
            Effect::IoAsk => "io.ask",
            Effect::ContractVerify => "contract.verify",
            Effect::ControlReturn => "control.return",
            Effect::FsRead => "fs.read",
            Effect::FsWrite => "fs.write",
            Effect::NetRequest => "net.request",
            Effect::EnvRead => "env.read",
            Effect::CryptoUse => "crypto.use",
        }
    }

    /// The total effect→capability mapping.
    pub fn capability(&self) -> Capability {
        match self {
            Effect::IoShow => Capability::IoWrite,
            Effect::IoAsk => Capability::IoRead,
            Effect::ContractVerify => Capability::Compute,
            Effect::ControlReturn => Capability::Compute,
            Effect::FsRead => Capability::FsRead,
            Effect::FsWrite => Capability::FsWrite,
            Effect::NetRequest => Capability::Net,
            Effect::EnvRead => Capability::Env,
            Effect::CryptoUse => Capability::Crypto,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonicalize a declared capability list: the legacy shorthands
/// `io` and `fs` expand to their read/write pairs, duplicates drop,
/// and the result is sorted. Unknown names survive untouched so the
/// enforcer can reject them with `HND-CAP-0001`.
pub fn canonicalize_caps(declared: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in declared {
        match cap.as_str() {
            "io" => {
                out.push("io.read".to_string());
                out.push("io.write".to_string());
            }
            "fs" => {
                out.push("fs.read".to_string());
                out.push("fs.write".to_string());
            }
            other => out.push(other.to_string()),
        }
    }
    out.sort();
    out.dedup();
    out
}
