//! Installs the adapter as this test binary's global allocator, so every heap
//! allocation below (and in the test runner itself) goes through the bridge.

use std::collections::HashMap;

use hostalloc_core::{
    ALLOCATION_LABEL, Bridge, HostAllocator, HostGlobalAlloc, HostKind, SystemHost, Tagging,
};

#[global_allocator]
static ALLOC: HostGlobalAlloc<SystemHost> = HostGlobalAlloc::new(SystemHost);

#[test]
fn collections_work_through_the_bridge() {
    let mut v: Vec<u64> = Vec::new();
    for i in 0..10_000 {
        v.push(i * 3);
    }
    assert_eq!(v.iter().sum::<u64>(), 3 * (9_999 * 10_000 / 2));

    let mut map = HashMap::new();
    for i in 0..1_000_u32 {
        map.insert(format!("key-{i}"), i);
    }
    assert_eq!(map.get("key-999"), Some(&999));

    v.shrink_to_fit();
    v.truncate(10);
    v.shrink_to_fit();
    assert_eq!(v, (0..10).map(|i| i * 3).collect::<Vec<_>>());
}

#[test]
fn boxed_values_at_host_alignment() {
    let boxes: Vec<Box<u128>> = (0..64_u128).map(Box::new).collect();
    for (i, b) in boxes.iter().enumerate() {
        assert_eq!(std::ptr::from_ref(&**b) as usize % align_of::<u128>(), 0);
        assert_eq!(**b, i as u128);
    }
}

#[repr(align(64))]
struct CacheLine([u8; 64]);

#[test]
fn over_aligned_boxes_are_aligned() {
    let boxes: Vec<Box<CacheLine>> = (0..32).map(|i| Box::new(CacheLine([i; 64]))).collect();
    for (i, b) in boxes.iter().enumerate() {
        assert_eq!(std::ptr::from_ref(&**b) as usize % 64, 0);
        assert_eq!(b.0[63], i as u8);
    }
}

#[test]
fn strings_grow_and_keep_contents() {
    let mut s = String::from("hostalloc");
    for _ in 0..12 {
        s = s.repeat(2);
        assert!(s.starts_with("hostallochostalloc"));
    }
    assert_eq!(s.len(), 9 * 4096);
}

#[test]
fn installed_adapter_forwards_through_build_bridge() {
    assert_eq!(ALLOC.bridge().label(), ALLOCATION_LABEL);
    assert_eq!(<SystemHost as HostAllocator>::KIND, HostKind::System);

    let tagged = HostGlobalAlloc::from_bridge(Bridge::with_tagging(SystemHost, Tagging::Debug));
    assert_eq!(tagged.bridge().label(), c"rust");
    let untagged =
        HostGlobalAlloc::from_bridge(Bridge::with_tagging(SystemHost, Tagging::Untagged));
    assert_eq!(untagged.bridge().label(), c"");
}
