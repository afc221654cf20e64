//! Abbreviations used in register names and field labels.

const TERMS: &[(&str, &str)] = &[
    ("ACC", "Apple Core Cluster"),
    ("AIC", "Apple Interrupt Controller"),
    ("APRR", "Access Protection and Read-only Region"),
    ("CTRR", "Configurable Text Read-only Region"),
    ("DAIF", "Debug, Abort, IRQ and FIQ mask bits"),
    ("EHID", "Hardware Implementation Defined register of an efficiency core"),
    ("FED", "Front End Decoder"),
    ("FIQ", "Fast Interrupt Request"),
    ("HID", "Hardware Implementation Defined register"),
    ("HVC", "Hypervisor Call"),
    ("IPI", "Inter-processor Interrupt"),
    ("IRQ", "Interrupt Request"),
    ("L2C", "L2 Cache"),
    ("LSU", "Load Store Unit"),
    ("MMU", "Memory Management Unit"),
    ("PMC", "Performance Monitor Counter"),
    ("PMCR", "Performance Monitor Control Register"),
    ("PMI", "Performance Monitor Interrupt"),
    ("PXN", "Privileged Execute Never"),
    ("SMC", "Secure Monitor Call"),
    ("UXN", "User Execute Never"),
    ("VMSA", "Virtual Memory System Architecture"),
    ("WFI", "Wait For Interrupt"),
];

/// Every term with its expansion, sorted by term
pub fn glossary() -> &'static [(&'static str, &'static str)]
{
    TERMS
}

/// Expansion of one term, ignoring case
///
/// ```rust
/// use aplreg_core::catalog::define;
///
/// assert_eq!(define("ctrr"), Some("Configurable Text Read-only Region"));
/// assert_eq!(define("XYZ"), None);
/// ```
pub fn define(term: &str) -> Option<&'static str>
{
    let term = term.trim();
    TERMS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(term))
        .map(|&(_, meaning)| meaning)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_terms_are_sorted_and_unique()
    {
        assert!(TERMS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }
}
