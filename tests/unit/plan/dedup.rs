use super::*;

fn sizes(raw: &[(u32, u32)]) -> Vec<Size> {
    raw.iter().map(|&(w, h)| Size::new(w, h)).collect()
}

#[test]
fn repeated_sizes_share_canonical_index() {
    let a = (10, 10);
    let b = (20, 20);
    let c = (30, 30);
    let plan = FrameSizePlan::from_sizes(sizes(&[a, b, a, c]));
    let dedup = DedupPlan::build(&plan);

    let expected: Vec<FrameIndex> = [0, 1, 0, 2].into_iter().map(FrameIndex).collect();
    assert_eq!(dedup.reference.positions(), expected.as_slice());
    assert_eq!(dedup.cache.len(), 3);
    assert_eq!(dedup.reference.max_index(), Some(FrameIndex(2)));
    assert_eq!(
        dedup.reference.distinct_indices(),
        vec![FrameIndex(0), FrameIndex(1), FrameIndex(2)]
    );
}

#[test]
fn adjacent_repeats_reduce_work_and_round_trip_sizes() {
    let raw = sizes(&[(5, 5), (5, 5), (6, 5), (6, 5), (6, 5), (7, 9), (5, 5)]);
    let plan = FrameSizePlan::from_sizes(raw.clone());
    let dedup = DedupPlan::build(&plan);

    assert!(dedup.cache.len() < plan.len());
    assert_eq!(dedup.reference.len(), plan.len());
    assert_eq!(dedup.resolved_sizes(), raw);
}

#[test]
fn constant_plan_collapses_to_one_index() {
    let plan = FrameSizePlan::from_sizes(vec![Size::new(100, 100); 4]);
    let dedup = DedupPlan::build(&plan);
    assert_eq!(dedup.cache.canonical_sizes(), &[Size::new(100, 100)]);
    assert_eq!(dedup.reference.positions(), &[FrameIndex(0); 4]);
}

#[test]
fn intern_is_first_seen_wins() {
    let mut cache = DedupCache::new();
    assert_eq!(cache.intern(Size::new(3, 4)), (FrameIndex(0), true));
    assert_eq!(cache.intern(Size::new(4, 3)), (FrameIndex(1), true));
    assert_eq!(cache.intern(Size::new(3, 4)), (FrameIndex(0), false));
    assert_eq!(cache.size_of(FrameIndex(1)), Some(Size::new(4, 3)));
    assert_eq!(cache.size_of(FrameIndex(2)), None);
}

#[test]
fn identity_reference_covers_every_position() {
    let r = SegmentReference::identity(3);
    assert_eq!(r.positions(), &[FrameIndex(0), FrameIndex(1), FrameIndex(2)]);
    assert!(SegmentReference::identity(0).is_empty());
    assert_eq!(SegmentReference::identity(0).max_index(), None);
}
