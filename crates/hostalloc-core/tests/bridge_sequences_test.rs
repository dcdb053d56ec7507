use hostalloc_core::{Bridge, SystemHost};

#[derive(Clone, Copy, Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn gen_range_usize(&mut self, low: usize, high_inclusive: usize) -> usize {
        assert!(low <= high_inclusive);
        let span = high_inclusive - low + 1;
        low + (self.next_u64() as usize % span)
    }
}

fn fill_byte(slot: usize, generation: usize) -> u8 {
    (slot.wrapping_mul(31) ^ generation) as u8
}

/// Every live block is filled with its own byte; any overlap or lost prefix
/// shows up as a foreign byte on the next check.
#[test]
fn deterministic_bridge_sequences_keep_blocks_disjoint_and_intact() {
    const SEEDS: [u64; 4] = [1, 2, 3, 4];
    const STEPS: usize = 2_000;
    const SLOTS: usize = 32;

    for seed in SEEDS {
        let bridge = Bridge::new(SystemHost);
        let mut rng = XorShift64::new(seed);

        let mut ptrs = [std::ptr::null_mut::<u8>(); SLOTS];
        let mut sizes = [0_usize; SLOTS];
        let mut fills = [0_u8; SLOTS];

        for step in 0..STEPS {
            let op = rng.gen_range_usize(0, 99);
            let idx = rng.gen_range_usize(0, SLOTS - 1);

            match op {
                // allocate
                0..=39 => {
                    if !ptrs[idx].is_null() {
                        continue;
                    }
                    let size = rng.gen_range_usize(1, 2048);
                    let p = bridge.allocate(size).cast::<u8>();
                    assert!(!p.is_null(), "seed={seed} step={step}: allocate({size})");
                    let fill = fill_byte(idx, step);
                    // SAFETY: p is a live block of `size` bytes.
                    unsafe { std::ptr::write_bytes(p, fill, size) };
                    ptrs[idx] = p;
                    sizes[idx] = size;
                    fills[idx] = fill;
                }
                // reallocate (including from null)
                40..=69 => {
                    let new_size = rng.gen_range_usize(1, 4096);
                    let old = ptrs[idx];
                    let old_size = sizes[idx];
                    // SAFETY: old is null or a live block from this bridge.
                    let q = unsafe { bridge.reallocate(old.cast(), new_size) }.cast::<u8>();
                    assert!(!q.is_null(), "seed={seed} step={step}: reallocate");
                    let kept = old_size.min(new_size);
                    // SAFETY: q is live for new_size bytes; first `kept` are preserved.
                    unsafe {
                        let bytes = std::slice::from_raw_parts(q, kept);
                        assert!(
                            bytes.iter().all(|&b| b == fills[idx]),
                            "seed={seed} step={step}: prefix lost on reallocate"
                        );
                    }
                    let fill = fill_byte(idx, step);
                    // SAFETY: q is live for new_size bytes.
                    unsafe { std::ptr::write_bytes(q, fill, new_size) };
                    ptrs[idx] = q;
                    sizes[idx] = new_size;
                    fills[idx] = fill;
                }
                // free
                _ => {
                    let p = ptrs[idx];
                    if p.is_null() {
                        continue;
                    }
                    // SAFETY: p is a live block from this bridge, freed once.
                    unsafe { bridge.free(p.cast()) };
                    ptrs[idx] = std::ptr::null_mut();
                    sizes[idx] = 0;
                }
            }

            if step % 64 != 0 {
                continue;
            }
            for slot in 0..SLOTS {
                if ptrs[slot].is_null() {
                    continue;
                }
                // SAFETY: live block of sizes[slot] bytes.
                let bytes = unsafe { std::slice::from_raw_parts(ptrs[slot], sizes[slot]) };
                assert!(
                    bytes.iter().all(|&b| b == fills[slot]),
                    "seed={seed} step={step}: slot {slot} corrupted"
                );
            }
        }

        for p in ptrs {
            if !p.is_null() {
                // SAFETY: remaining live blocks, freed once.
                unsafe { bridge.free(p.cast()) };
            }
        }
    }
}
