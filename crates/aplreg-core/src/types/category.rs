//! Register categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Coarse functional grouping of system registers
///
/// Categories drive filtering (`dump --category`, `list --category`) and the
/// grouping of reports. The set is closed; registers that fit nowhere else
/// are `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category
{
    /// Hardware Implementation Defined registers (`HIDn`/`EHIDn`), mostly chicken bits
    Hid,
    /// Core performance monitor control and counters (`PMCRn`, `PMCn`, `PMESRn`)
    PerfCounter,
    /// Load/store, L2 cache, fetch and MMU error status registers
    ErrorHandling,
    /// Apple-only control and key registers (`APCTL`, `APSTS`, kernel keys)
    AppleSpecific,
    /// APRR and CTRR protection controls
    MemoryProtection,
    /// Fast IPI and VM timer control
    Interrupts,
    /// ACC and cycle override registers
    PowerManagement,
    /// Uncore (cluster) performance monitor
    UncorePerf,
    /// Everything else, including architectural registers kept for convenience
    Other,
}

impl Category
{
    /// Every category, in display order
    pub const ALL: [Category; 9] = [
        Category::Hid,
        Category::PerfCounter,
        Category::ErrorHandling,
        Category::AppleSpecific,
        Category::MemoryProtection,
        Category::Interrupts,
        Category::PowerManagement,
        Category::UncorePerf,
        Category::Other,
    ];

    /// Stable display name
    pub const fn as_str(self) -> &'static str
    {
        match self {
            Category::Hid => "HID",
            Category::PerfCounter => "PerfCounter",
            Category::ErrorHandling => "ErrorHandling",
            Category::AppleSpecific => "AppleSpecific",
            Category::MemoryProtection => "MemoryProtection",
            Category::Interrupts => "Interrupts",
            Category::PowerManagement => "PowerManagement",
            Category::UncorePerf => "UncorePerf",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category
{
    type Err = String;

    /// Case-insensitive; underscores and dashes are ignored so the older
    /// group names (`Performance_Counters`, `Error_Handling`, ...) still parse.
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "hid" => Ok(Category::Hid),
            "perfcounter" | "perfcounters" | "performancecounters" | "pmc" => Ok(Category::PerfCounter),
            "errorhandling" | "errors" => Ok(Category::ErrorHandling),
            "applespecific" | "apple" => Ok(Category::AppleSpecific),
            "memoryprotection" | "protection" => Ok(Category::MemoryProtection),
            "interrupts" | "ipi" => Ok(Category::Interrupts),
            "powermanagement" | "power" => Ok(Category::PowerManagement),
            "uncoreperf" | "uncoreperformance" | "upmc" => Ok(Category::UncorePerf),
            "other" => Ok(Category::Other),
            _ => {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                Err(format!("Unknown category: {s}. Use one of {}", names.join(", ")))
            }
        }
    }
}

impl Serialize for Category
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error>
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
