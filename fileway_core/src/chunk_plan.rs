//! Pure function mapping a payload size to the chunk sizes a sender uploads.
use crate::config::CHUNK_SIZE_INITIAL;

const CHUNK_SIZE_RAMP_FACTOR: u64 = 2;

/// Builds the ordered sequence of chunk sizes a sender must upload for a
/// payload of `size` bytes, ramping from [`CHUNK_SIZE_INITIAL`] up to
/// `chunk_ceiling`.
///
/// The first few chunks are small so the receiver sees progress almost
/// immediately; later chunks grow geometrically until they saturate the
/// ceiling, amortizing per-request overhead on large transfers.
///
/// Every element is positive and the sum equals `size` exactly.
pub fn build_chunk_plan(size: u64, chunk_ceiling: u64) -> Vec<u64> {
    if size < CHUNK_SIZE_INITIAL {
        return vec![size];
    }

    let mut sum = CHUNK_SIZE_INITIAL;
    let mut last_chunk = CHUNK_SIZE_INITIAL;
    let mut plan = vec![CHUNK_SIZE_INITIAL];

    loop {
        let remaining = size - sum;
        let next_chunk = (last_chunk * CHUNK_SIZE_RAMP_FACTOR)
            .min(chunk_ceiling)
            .min(remaining);
        plan.push(next_chunk);
        sum += next_chunk;
        if sum == size {
            return plan;
        }
        last_chunk = next_chunk;
    }
}

/// The fixed single-element plan used for text conduits, regardless of size.
pub fn text_chunk_plan(size: u64) -> Vec<u64> {
    vec![size]
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEILING: u64 = 4 * 1024 * 1024;

    #[test]
    fn small_payload_is_a_single_chunk() {
        assert_eq!(build_chunk_plan(1024, CEILING), vec![1024]);
        assert_eq!(build_chunk_plan(4095, CEILING), vec![4095]);
    }

    #[test]
    fn ramp_up_plan_sums_to_size() {
        let plan = build_chunk_plan(10_000_000, CEILING);
        assert_eq!(plan.iter().sum::<u64>(), 10_000_000);
        assert_eq!(
            &plan[..7],
            &[4096, 8192, 16384, 32768, 65536, 131072, 262144]
        );
        // non-decreasing until it saturates at the ceiling
        for pair in plan.windows(2) {
            assert!(pair[1] >= pair[0] || pair[1] == *plan.last().unwrap());
        }
    }

    #[test]
    fn every_element_is_positive_and_bounded() {
        for size in [4096, 4097, 1_000_000, 50_000_000, 3, 1] {
            let plan = build_chunk_plan(size, CEILING);
            assert_eq!(plan.iter().sum::<u64>(), size);
            for &chunk in &plan {
                assert!(chunk > 0, "size={size} produced a zero chunk: {plan:?}");
                assert!(chunk <= CEILING.max(size));
            }
        }
    }

    #[test]
    fn property_sum_equals_size_for_many_sizes_and_ceilings() {
        for ceiling in [CHUNK_SIZE_INITIAL, 8192, 1_048_576, CEILING] {
            for size in (1u64..200_000).step_by(997) {
                let plan = build_chunk_plan(size, ceiling);
                assert_eq!(plan.iter().sum::<u64>(), size, "ceiling={ceiling} size={size}");
                assert!(plan.iter().all(|&c| c > 0 && c <= ceiling.max(size)));
            }
        }
    }

    #[test]
    fn text_plan_is_always_one_chunk() {
        assert_eq!(text_chunk_plan(0), vec![0]);
        assert_eq!(text_chunk_plan(999_999), vec![999_999]);
    }
}
