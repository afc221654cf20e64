//! Apple Silicon seed definitions.
//!
//! Collected from public reverse-engineering work (Asahi Linux, m1n1 and
//! assorted research notes). None of it is vendor documentation: field
//! boundaries and enumerations are best-effort and vary between core
//! generations. `Catalog::new` still validates every entry, so a bad edit
//! here fails loudly at load rather than producing garbage output.

use crate::types::{Category, Encoding, Enumeration, FieldDefinition, RegisterDefinition};

type Parts = (u8, u8, u8, u8, u8);

fn reg(name: &str, (op0, op1, crn, crm, op2): Parts, category: Category, description: &str) -> RegisterDefinition
{
    RegisterDefinition::new(name, Encoding::new_unchecked(op0, op1, crn, crm, op2), category)
        .with_description(description)
}

/// Every seed register, grouped by category
pub(super) fn definitions() -> Vec<RegisterDefinition>
{
    let mut defs = Vec::new();
    defs.extend(hid());
    defs.extend(perf_counters());
    defs.extend(error_handling());
    defs.extend(apple_specific());
    defs.extend(memory_protection());
    defs.extend(interrupts());
    defs.extend(power_management());
    defs.extend(uncore_perf());
    defs.extend(other());
    defs
}

fn hid() -> Vec<RegisterDefinition>
{
    let mut defs = vec![
        reg("SYS_APL_HID0_EL1", (3, 0, 15, 0, 0), Category::Hid, "Hardware Implementation Defined Register 0").with_fields([
            FieldDefinition::flag(20, "Loop Buffer Disable"),
            FieldDefinition::flag(21, "AMX Cache Fusion Disable"),
            FieldDefinition::flag(25, "IC Prefetch Limit One Brn"),
            FieldDefinition::flag(28, "Fetch Width Disable"),
            FieldDefinition::flag(33, "PMULL Fuse Disable"),
            FieldDefinition::flag(36, "Cache Fusion Disable"),
            FieldDefinition::flag(45, "Same Pg Power Optimization"),
            FieldDefinition::counter(62, 60, "Instruction Cache Prefetch Depth"),
        ]),
        reg("SYS_APL_EHID0_EL1", (3, 0, 15, 0, 1), Category::Hid, "E-core Hardware Implementation Defined Register 0")
            .with_field(FieldDefinition::flag(45, "nfpRetFwdDisb")),
        reg("SYS_APL_HID1_EL1", (3, 0, 15, 1, 0), Category::Hid, "Hardware Implementation Defined Register 1").with_fields([
            FieldDefinition::flag(14, "Disable CMP-Branch Fusion"),
            FieldDefinition::flag(15, "ForceMextL3ClkOn"),
            FieldDefinition::flag(23, "rccForceAllIexL3ClksOn"),
            FieldDefinition::flag(24, "rccDisStallInactiveIexCtl"),
            FieldDefinition::flag(25, "disLspFlushWithContextSwitch"),
            FieldDefinition::flag(44, "Disable AES Fusion across groups"),
            FieldDefinition::flag(49, "Disable MSR Speculation DAIF"),
            FieldDefinition::flag(54, "Trap SMC"),
            FieldDefinition::flag(58, "enMDSBStallPipeLineECO"),
            FieldDefinition::flag(60, "Enable Branch Kill Limit / SpareBit6"),
        ]),
        reg("SYS_APL_EHID1_EL1", (3, 0, 15, 1, 1), Category::Hid, "E-core Hardware Implementation Defined Register 1")
            .with_field(FieldDefinition::flag(30, "Disable MSR Speculation DAIF")),
    ];

    for n in 2..=11u8 {
        defs.push(reg(
            &format!("SYS_APL_HID{n}_EL1"),
            (3, 0, 15, n, 0),
            Category::Hid,
            &format!("Hardware Implementation Defined Register {n}"),
        ));
    }

    for (n, parts) in [
        (13, (3, 0, 15, 14, 0)),
        (14, (3, 0, 15, 15, 0)),
        (16, (3, 0, 15, 15, 2)),
        (17, (3, 0, 15, 15, 5)),
        (18, (3, 0, 15, 11, 2)),
        (21, (3, 0, 15, 1, 3)),
    ] {
        defs.push(reg(
            &format!("SYS_APL_HID{n}_EL1"),
            parts,
            Category::Hid,
            &format!("Hardware Implementation Defined Register {n}"),
        ));
    }

    defs
}

fn perf_counters() -> Vec<RegisterDefinition>
{
    let interrupt_mode = Enumeration::new()
        .with(0, "off")
        .with(1, "PMI")
        .with(2, "AIC")
        .with(3, "HALT")
        .with(4, "FIQ");

    let mut defs = vec![
        reg("SYS_APL_PMCR0_EL1", (3, 1, 15, 0, 0), Category::PerfCounter, "Performance Monitor Control Register 0")
            .with_fields([
                FieldDefinition::raw(7, 0, "Counter Enable PMC 7-0"),
                FieldDefinition::enumerated(10, 8, "Interrupt Mode", interrupt_mode),
                FieldDefinition::flag(11, "PMI Interrupt Active"),
                FieldDefinition::raw(19, 12, "Enable PMI for PMC 7-0"),
                FieldDefinition::flag(20, "Disable Counting on PMI"),
                FieldDefinition::flag(22, "Block PMIs until after eret"),
                FieldDefinition::flag(23, "Count Global L2C Events"),
                FieldDefinition::flag(30, "User-mode Access Enable"),
                FieldDefinition::raw(33, 32, "Counter Enable PMC 9-8"),
                FieldDefinition::raw(45, 44, "Enable PMI for PMC 9-8"),
            ]),
    ];

    for n in 1..=4u8 {
        defs.push(reg(
            &format!("SYS_APL_PMCR{n}_EL1"),
            (3, 1, 15, n, 0),
            Category::PerfCounter,
            &format!("Performance Monitor Control Register {n}"),
        ));
    }

    defs.push(reg(
        "SYS_APL_PMESR0_EL1",
        (3, 1, 15, 5, 0),
        Category::PerfCounter,
        "Event selection for PMC 2-5",
    ));
    defs.push(reg(
        "SYS_APL_PMESR1_EL1",
        (3, 1, 15, 6, 0),
        Category::PerfCounter,
        "Event selection for PMC 6-9",
    ));
    defs.push(reg(
        "SYS_APL_PMSR_EL1",
        (3, 1, 15, 13, 0),
        Category::PerfCounter,
        "Performance Monitor Status Register (overflow bits)",
    ));

    let counters = (0..=7u8).map(|n| (n, n)).chain([(8, 9), (9, 10)]);
    for (n, crm) in counters {
        defs.push(
            reg(
                &format!("SYS_APL_PMC{n}_EL1"),
                (3, 2, 15, crm, 0),
                Category::PerfCounter,
                &format!("Performance Monitor Counter {n}"),
            )
            .with_fields([
                FieldDefinition::counter(46, 0, "Counter Value"),
                FieldDefinition::flag(47, "Overflow"),
            ]),
        );
    }

    defs
}

fn error_handling() -> Vec<RegisterDefinition>
{
    let access_type = Enumeration::new()
        .with(5, "data write")
        .with(6, "data read")
        .with(7, "instruction fetch");

    vec![
        reg("SYS_APL_LSU_ERR_STS_EL1", (3, 3, 15, 0, 0), Category::ErrorHandling, "Load/Store Unit Error Status"),
        reg("SYS_APL_LSU_ERR_CTL_EL1", (3, 3, 15, 1, 0), Category::ErrorHandling, "Load/Store Unit Error Control"),
        reg("SYS_APL_L2C_ERR_STS_EL1", (3, 3, 15, 8, 0), Category::ErrorHandling, "L2 Cache Error Status Register")
            .with_fields([
                FieldDefinition::flag(1, "Recursive Fault"),
                FieldDefinition::flag(7, "Access Fault"),
                FieldDefinition::raw(38, 34, "Enable Flags 38-34"),
                FieldDefinition::flag(39, "Enable SError Interrupts"),
                FieldDefinition::raw(43, 40, "Enable Flags 43-40"),
                FieldDefinition::flag(56, "Write-1-to-clear Behavior"),
                FieldDefinition::flag(60, "Some Enable"),
            ]),
        reg("SYS_APL_L2C_ERR_ADR_EL1", (3, 3, 15, 9, 0), Category::ErrorHandling, "L2 Cache Error Address Register")
            .with_fields([
                FieldDefinition::raw(41, 0, "Physical Address"),
                FieldDefinition::flag(42, "Unknown Bit 42"),
                FieldDefinition::enumerated(57, 55, "Access Type", access_type),
                FieldDefinition::counter(62, 61, "Core within Cluster"),
            ]),
        reg("SYS_APL_L2C_ERR_INF_EL1", (3, 3, 15, 10, 0), Category::ErrorHandling, "L2 Cache Error Information")
            .with_fields([
                FieldDefinition::raw(25, 0, "Error Information"),
                FieldDefinition::flag(26, "Address Alignment"),
            ]),
        reg("SYS_APL_FED_ERR_STS_EL1", (3, 4, 15, 0, 0), Category::ErrorHandling, "Fetch/Decode Error Status"),
        reg("SYS_APL_MMU_ERR_STS_EL1", (3, 6, 15, 0, 0), Category::ErrorHandling, "MMU Error Status"),
        reg("SYS_APL_E_MMU_ERR_STS_EL1", (3, 6, 15, 2, 0), Category::ErrorHandling, "E-core MMU Error Status"),
        reg("SYS_APL_DPC_ERR_STS_EL1", (3, 5, 15, 0, 5), Category::ErrorHandling, "DPC Error Status"),
    ]
}

fn apple_specific() -> Vec<RegisterDefinition>
{
    vec![
        reg("SYS_APL_APCTL_EL1", (3, 4, 15, 0, 4), Category::AppleSpecific, "Pointer authentication control"),
        reg("SYS_APL_KERNELKEYLO_EL1", (3, 4, 15, 1, 0), Category::AppleSpecific, "Kernel key, low half"),
        reg("SYS_APL_KERNELKEYHI_EL1", (3, 4, 15, 1, 1), Category::AppleSpecific, "Kernel key, high half"),
        reg("SYS_APL_AFPCR_EL0", (3, 6, 15, 2, 5), Category::AppleSpecific, "Apple floating point control"),
        reg("SYS_APL_APSTS_EL1", (3, 6, 15, 12, 4), Category::AppleSpecific, "Pointer authentication status"),
    ]
}

/// Permission encoding of one APRR entry: X is bit 0, W bit 1, R bit 2
fn aprr_permissions() -> Enumeration
{
    (0..8u64)
        .map(|value| {
            let r = if value & 0b100 != 0 { 'r' } else { '-' };
            let w = if value & 0b010 != 0 { 'w' } else { '-' };
            let x = if value & 0b001 != 0 { 'x' } else { '-' };
            (value, format!("{r}{w}{x}"))
        })
        .collect()
}

fn aprr_entries() -> Vec<FieldDefinition>
{
    (0..16u8)
        .map(|n| FieldDefinition::enumerated(n * 4 + 3, n * 4, format!("Entry {n}"), aprr_permissions()))
        .collect()
}

fn memory_protection() -> Vec<RegisterDefinition>
{
    let address = |label: &str| FieldDefinition::raw(47, 0, label);

    vec![
        reg("SYS_APL_VMSA_LOCK_EL1", (3, 4, 15, 1, 2), Category::MemoryProtection, "VMSA lock"),
        reg(
            "SYS_APL_APRR_EL0",
            (3, 4, 15, 2, 0),
            Category::MemoryProtection,
            "Access Protection and Read-only Region Register (EL0)",
        )
        .with_fields(aprr_entries()),
        reg(
            "SYS_APL_APRR_EL1",
            (3, 4, 15, 2, 1),
            Category::MemoryProtection,
            "Access Protection and Read-only Region Register (EL1)",
        )
        .with_fields(aprr_entries()),
        reg("SYS_APL_CTRR_LOCK_EL1", (3, 4, 15, 2, 2), Category::MemoryProtection, "CTRR lock (EL1)")
            .with_field(FieldDefinition::flag(0, "Lock Status")),
        reg("SYS_APL_CTRR_A_LWR_EL1", (3, 4, 15, 2, 3), Category::MemoryProtection, "CTRR region A lower bound (EL1)")
            .with_field(address("Lower Address")),
        reg("SYS_APL_CTRR_A_UPR_EL1", (3, 4, 15, 2, 4), Category::MemoryProtection, "CTRR region A upper bound (EL1)")
            .with_field(address("Upper Address")),
        reg(
            "SYS_APL_CTRR_CTL_EL1",
            (3, 4, 15, 2, 5),
            Category::MemoryProtection,
            "Configurable Text Read-only Region Control Register",
        )
        .with_fields([
            FieldDefinition::flag(0, "A MMU off write protect"),
            FieldDefinition::flag(1, "A MMU on write protect"),
            FieldDefinition::flag(2, "B MMU off write protect"),
            FieldDefinition::flag(3, "B MMU on write protect"),
            FieldDefinition::flag(4, "A PXN"),
            FieldDefinition::flag(5, "B PXN"),
            FieldDefinition::flag(6, "A UXN"),
            FieldDefinition::flag(7, "B UXN"),
        ]),
        reg("SYS_APL_APRR_JIT_ENABLE_EL2", (3, 4, 15, 2, 6), Category::MemoryProtection, "APRR JIT enable"),
        reg("SYS_APL_APRR_JIT_MASK_EL2", (3, 4, 15, 2, 7), Category::MemoryProtection, "APRR JIT mask"),
        reg("SYS_APL_CTRR_A_LWR_EL2", (3, 4, 15, 11, 0), Category::MemoryProtection, "CTRR region A lower bound (EL2)")
            .with_field(address("Lower Address")),
        reg("SYS_APL_CTRR_A_UPR_EL2", (3, 4, 15, 11, 1), Category::MemoryProtection, "CTRR region A upper bound (EL2)")
            .with_field(address("Upper Address")),
        reg("SYS_APL_CTRR_CTL_EL2", (3, 4, 15, 11, 4), Category::MemoryProtection, "CTRR control (EL2)"),
        reg("SYS_APL_CTRR_LOCK_EL2", (3, 4, 15, 11, 5), Category::MemoryProtection, "CTRR lock (EL2)")
            .with_field(FieldDefinition::flag(0, "Lock Status")),
    ]
}

fn interrupts() -> Vec<RegisterDefinition>
{
    let rr_type = || {
        Enumeration::new()
            .with(0, "immediate")
            .with(1, "retract")
            .with(2, "deferred")
            .with(3, "nowake")
    };

    vec![
        reg("SYS_APL_IPI_RR_LOCAL_EL1", (3, 5, 15, 0, 0), Category::Interrupts, "Fast IPI request, local cluster")
            .with_fields([
                FieldDefinition::counter(3, 0, "Target CPU"),
                FieldDefinition::enumerated(29, 28, "RR Type", rr_type()),
            ]),
        reg("SYS_APL_IPI_RR_GLOBAL_EL1", (3, 5, 15, 0, 1), Category::Interrupts, "Fast IPI request, any cluster")
            .with_fields([
                FieldDefinition::counter(3, 0, "Target CPU"),
                FieldDefinition::counter(20, 16, "Target Cluster"),
                FieldDefinition::enumerated(29, 28, "RR Type", rr_type()),
            ]),
        reg("SYS_APL_IPI_SR_EL1", (3, 5, 15, 1, 1), Category::Interrupts, "Fast IPI status")
            .with_field(FieldDefinition::flag(0, "IPI Pending")),
        reg("SYS_APL_VM_TMR_LR_EL2", (3, 5, 15, 1, 2), Category::Interrupts, "VM timer list register")
            .with_field(FieldDefinition::raw(63, 62, "State")),
        reg("SYS_APL_VM_TMR_FIQ_ENA_EL2", (3, 5, 15, 1, 3), Category::Interrupts, "VM timer FIQ enable").with_fields([
            FieldDefinition::flag(0, "CNTV Guest Timer Mask"),
            FieldDefinition::flag(1, "CNTP Guest Timer Mask"),
        ]),
        reg("SYS_APL_IPI_CR_EL1", (3, 5, 15, 3, 1), Category::Interrupts, "Fast IPI control")
            .with_field(FieldDefinition::counter(15, 0, "Deferred IPI Countdown")),
    ]
}

fn power_management() -> Vec<RegisterDefinition>
{
    vec![
        reg("SYS_APL_ACC_CFG_EL1", (3, 5, 15, 4, 0), Category::PowerManagement, "Apple Core Cluster configuration")
            .with_field(FieldDefinition::raw(3, 2, "BP Sleep")),
        reg("SYS_APL_CYC_OVRD_EL1", (3, 5, 15, 5, 0), Category::PowerManagement, "Cycle override").with_fields([
            FieldDefinition::flag(0, "Disable WFI Return"),
            FieldDefinition::raw(21, 20, "FIQ Mode"),
            FieldDefinition::raw(23, 22, "IRQ Mode"),
            FieldDefinition::raw(25, 24, "OK To Power Down"),
        ]),
        reg("SYS_APL_ACC_OVRD_EL1", (3, 5, 15, 6, 0), Category::PowerManagement, "Apple Core Cluster override")
            .with_fields([
                FieldDefinition::raw(14, 13, "OK To Power Down SRM"),
                FieldDefinition::raw(16, 15, "Disable L2 Flush For ACC Sleep"),
                FieldDefinition::raw(18, 17, "OK To Train Down Link"),
                FieldDefinition::raw(26, 25, "OK To Power Down CPM"),
                FieldDefinition::raw(28, 27, "CPM Wakeup"),
                FieldDefinition::flag(29, "Disable Clock Dtr"),
                FieldDefinition::flag(32, "Disable PIO On WFI CPU"),
                FieldDefinition::flag(34, "Enable Deep Sleep"),
            ]),
        reg("SYS_APL_ACC_EBLK_OVRD_EL1", (3, 5, 15, 6, 1), Category::PowerManagement, "E-block override"),
    ]
}

fn uncore_perf() -> Vec<RegisterDefinition>
{
    let mut defs = vec![
        reg("SYS_APL_UPMCR0_EL1", (3, 7, 15, 0, 4), Category::UncorePerf, "Uncore PMU control"),
        reg("SYS_APL_UPMESR0_EL1", (3, 7, 15, 1, 4), Category::UncorePerf, "Uncore PMU event selection 0"),
        reg("SYS_APL_UPMECM0_EL1", (3, 7, 15, 3, 4), Category::UncorePerf, "Uncore PMU core mask 0"),
        reg("SYS_APL_UPMECM1_EL1", (3, 7, 15, 4, 4), Category::UncorePerf, "Uncore PMU core mask 1"),
        reg("SYS_APL_UPMPCM_EL1", (3, 7, 15, 5, 4), Category::UncorePerf, "Uncore PMU PMI core mask"),
        reg("SYS_APL_UPMSR_EL1", (3, 7, 15, 6, 4), Category::UncorePerf, "Uncore PMU status"),
        reg("SYS_APL_UPMECM2_EL1", (3, 7, 15, 8, 5), Category::UncorePerf, "Uncore PMU core mask 2"),
        reg("SYS_APL_UPMECM3_EL1", (3, 7, 15, 9, 5), Category::UncorePerf, "Uncore PMU core mask 3"),
        reg("SYS_APL_UPMESR1_EL1", (3, 7, 15, 11, 5), Category::UncorePerf, "Uncore PMU event selection 1"),
    ];

    let counters = (0..=7u8).map(|n| (n, (3, 7, 15, n + 7, 4))).chain((8..=15u8).map(|n| (n, (3, 7, 15, n - 8, 5))));
    for (n, parts) in counters {
        defs.push(
            reg(
                &format!("SYS_APL_UPMC{n}_EL1"),
                parts,
                Category::UncorePerf,
                &format!("Uncore Performance Monitor Counter {n}"),
            )
            .with_fields([
                FieldDefinition::counter(62, 0, "Counter Value"),
                FieldDefinition::flag(63, "Overflow"),
            ]),
        );
    }

    defs
}

fn other() -> Vec<RegisterDefinition>
{
    let exception_class = Enumeration::new()
        .with(0x00, "Unknown reason")
        .with(0x01, "Trapped WFI/WFE")
        .with(0x07, "SVE/SIMD/FP access")
        .with(0x15, "SVC (AArch64)")
        .with(0x16, "HVC (AArch64)")
        .with(0x17, "SMC (AArch64)")
        .with(0x18, "MSR/MRS trap")
        .with(0x20, "Instruction Abort (lower EL)")
        .with(0x21, "Instruction Abort (same EL)")
        .with(0x22, "PC alignment fault")
        .with(0x24, "Data Abort (lower EL)")
        .with(0x25, "Data Abort (same EL)")
        .with(0x26, "SP alignment fault")
        .with(0x2C, "Floating-point exception")
        .with(0x2F, "SError")
        .with(0x30, "Breakpoint (lower EL)")
        .with(0x31, "Breakpoint (same EL)")
        .with(0x32, "Software step (lower EL)")
        .with(0x33, "Software step (same EL)")
        .with(0x34, "Watchpoint (lower EL)")
        .with(0x35, "Watchpoint (same EL)")
        .with(0x3C, "BRK instruction");

    vec![
        reg("ESR_EL1", (3, 0, 5, 2, 0), Category::Other, "Exception Syndrome Register (EL1)").with_fields([
            FieldDefinition::raw(24, 0, "ISS"),
            FieldDefinition::flag(25, "IL"),
            FieldDefinition::enumerated(31, 26, "EC", exception_class),
            FieldDefinition::raw(36, 32, "ISS2"),
        ]),
    ]
}
