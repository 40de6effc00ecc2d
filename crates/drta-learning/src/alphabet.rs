use drta_core::region::Region;
use drta_core::trace::Sample;

/// Computes the maximal constant `\u{3ba}` from the sample set: the smallest integer that
/// is `>=` every timestamp occurring in any trace.
pub fn kappa(sample: &Sample) -> u64 {
    let max = sample.max_time();
    max.ceil() as u64
}

/// The canonical region alphabet for a sample set: `[0,0], (0,1), [1,1], \u{2026}, [\u{3ba},\u{3ba}],
/// (\u{3ba}, \u{221e})`. This is the *regular* alphabet used to map raw timestamps onto guards
/// when constructing the timed-APTA (§4.2); it is distinct from the per-insertion mapping
/// used by Min-3RTA in §4.3, which only ever produces a subset of regions actually
/// witnessed by the sample.
pub fn region_alphabet(kappa: u64) -> Vec<Region> {
    let mut regions = Vec::with_capacity(2 * kappa as usize + 2);
    regions.push(Region::point(0));
    for i in 0..kappa {
        regions.push(Region::open(i, i + 1));
        regions.push(Region::point(i + 1));
    }
    regions.push(Region::unbounded_open(kappa));
    regions
}

/// Finds the unique region in a canonical alphabet (as built by [`region_alphabet`]) that
/// contains `t`. The alphabet is disjoint and total by construction, so at most one
/// region ever matches.
pub fn region_for(regions: &[Region], t: f64) -> Option<Region> {
    regions.iter().find(|r| r.contains(t)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::trace::TimedTrace;

    #[test]
    fn kappa_rounds_up() {
        let sample = Sample::new(
            vec![TimedTrace::from_iter([("a", 1.0)]), TimedTrace::from_iter([("a", 1.3)])],
            vec![],
        );
        assert_eq!(kappa(&sample), 2);
    }

    #[test]
    fn alphabet_is_total_and_disjoint() {
        let regions = region_alphabet(3);
        // totality: every sampled point up to well past kappa is covered by exactly one region.
        for i in 0..100 {
            let t = i as f64 / 10.0;
            let matches: Vec<_> = regions.iter().filter(|r| r.contains(t)).collect();
            assert_eq!(matches.len(), 1, "t={t} matched {matches:?}");
        }
    }

    #[test]
    fn unbounded_region_is_last() {
        let regions = region_alphabet(2);
        assert_eq!(regions.last().unwrap().hi(), Bound::Infinite);
    }
}
