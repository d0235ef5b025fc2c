#![no_main]

use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tandem::{SlabConfig, SlabSlot, Tandem, SLAB_SLOT_COUNT};

#[derive(Arbitrary, Debug)]
enum Action {
    /// Allocate size % 0x1000 bytes
    Alloc { size: u16 },
    /// Free the ith live allocation
    Free { index: u8 },
    /// Free the ith live allocation twice in a row
    DoubleFree { index: u8 },
    /// Rewrite a live allocation's payload
    Scribble { index: u8, byte: u8 },
}
use Action::*;

fuzz_target!(|actions: Vec<Action>| {
    let mut region = vec![0u64; 1 << 12];
    let mut tandem = Tandem::new();

    let mut slots = [SlabSlot::INERT; SLAB_SLOT_COUNT];
    slots[0] = SlabSlot::new(16, 32);
    slots[1] = SlabSlot::new(64, 16);

    unsafe {
        tandem
            .init(region.as_mut_ptr().cast(), region.len() * 8, &SlabConfig::new(slots))
            .unwrap();
    }

    let mut live: Vec<(*mut u8, usize)> = vec![];

    for action in actions {
        match action {
            Alloc { size } => {
                let size = size as usize % 0x1000;
                if let Some(ptr) = unsafe { tandem.alloc(size) } {
                    unsafe { ptr.as_ptr().write_bytes(0xab, size.max(1)) };
                    live.push((ptr.as_ptr(), size));
                }
            }
            Free { index } => {
                if (index as usize) < live.len() {
                    let (ptr, _) = live.swap_remove(index as usize);
                    unsafe { tandem.free(ptr) };
                }
            }
            DoubleFree { index } => {
                if (index as usize) < live.len() {
                    let (ptr, _) = live.swap_remove(index as usize);
                    unsafe {
                        tandem.free(ptr);
                        tandem.free(ptr);
                    }
                }
            }
            Scribble { index, byte } => {
                if (index as usize) < live.len() {
                    let (ptr, size) = live[index as usize];
                    unsafe { ptr.write_bytes(byte, size.max(1)) };
                }
            }
        }
    }

    for (ptr, _) in live {
        unsafe { tandem.free(ptr) };
    }
});
