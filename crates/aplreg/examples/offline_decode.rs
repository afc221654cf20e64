//! Example: decode and compare register values without a live target
//!
//! Builds two snapshots from values an in-memory reader hands out, prints the
//! decoded HID0 value and the differences between the snapshots.
//!
//! Run with `RUST_LOG=debug` to see every register read.

use aplreg_core::prelude::*;
use aplreg_core::report;
use aplreg_utils::{info, init_logging};

fn main() -> Result<()>
{
    let _logging = init_logging().expect("Failed to initialize logging");

    let catalog = Catalog::apple_silicon()?;
    let hid0 = catalog
        .lookup("SYS_APL_HID0_EL1")
        .expect("HID0 is in the seed catalog");

    let mut reader = StaticReader::new().with_value(hid0.encoding, 0x0000_0000_0010_0000);
    let mut engine = DumpEngine::new(&catalog, &mut reader);
    let before = engine.dump("before", Some(Category::Hid));
    info!(tally = %before.tally, "First dump finished");

    let mut reader = StaticReader::new().with_value(hid0.encoding, 0x0000_0000_0010_0001);
    let mut engine = DumpEngine::new(&catalog, &mut reader);
    let after = engine.dump("after", Some(Category::Hid));

    let value = after.snapshot.get(&hid0.name).and_then(RawReading::value).unwrap_or_default();
    let fields = parse_value(hid0, value)?;
    print!("{}", report::register_text(hid0, value, &fields));

    let diff = compare(&catalog, &before.snapshot, &after.snapshot)?;
    print!("{}", report::diff_text(before.snapshot.label(), after.snapshot.label(), &diff));

    Ok(())
}
