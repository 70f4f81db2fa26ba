use fxhash::FxHashSet;

use crate::problem::ProblemData;
use crate::rng::XorShift128;
use crate::solution::Solution;

/// Ordered crossover (OX) over the giant tours of both parents: a random
/// wrap-around window is copied from the first parent, and the remaining
/// positions are filled with the missing clients in the order the second
/// parent visits them. Intended for single-vehicle instances, where the
/// giant tour *is* the route.
pub fn ordered_crossover(
    parents: (&Solution, &Solution),
    data: &ProblemData,
    rng: &mut XorShift128,
) -> Solution {
    let tour_a: Vec<usize> = parents.0.routes().iter().flat_map(|r| r.visits()).copied().collect();
    let tour_b: Vec<usize> = parents.1.routes().iter().flat_map(|r| r.visits()).copied().collect();

    assert!(!tour_a.is_empty(), "first parent visits no clients");
    debug_assert_eq!(
        {
            let mut a = tour_a.clone();
            a.sort_unstable();
            a
        },
        {
            let mut b = tour_b.clone();
            b.sort_unstable();
            b
        },
        "parents must visit the same clients"
    );

    let num = tour_a.len();
    let start = rng.randint(num as u32) as usize;
    let length = if num == 1 {
        1
    } else {
        1 + rng.randint(num as u32 - 1) as usize
    };

    let mut offspring = vec![usize::MAX; num];
    let mut copied = FxHashSet::default();
    for offset in 0..length {
        let pos = (start + offset) % num;
        offspring[pos] = tour_a[pos];
        copied.insert(tour_a[pos]);
    }

    // Fill the remaining positions from the second parent, starting right
    // after the copied window.
    let mut fill_pos = (start + length) % num;
    for offset in 0..num {
        let client = tour_b[(start + length + offset) % num];
        if !copied.contains(&client) {
            offspring[fill_pos] = client;
            fill_pos = (fill_pos + 1) % num;
        }
    }

    let vehicle_type = parents.0.routes()[0].vehicle_type();
    Solution::new(data, vec![(vehicle_type, offspring)]).expect("parents are valid solutions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VehicleType;
    use crate::test_utils;

    #[test]
    fn offspring_visits_every_client_exactly_once() {
        let data = test_utils::line_problem(6, vec![VehicleType::new(1, 100)]);
        let a = Solution::new(&data, vec![(0, vec![1, 2, 3, 4, 5, 6])]).unwrap();
        let b = Solution::new(&data, vec![(0, vec![6, 4, 2, 1, 3, 5])]).unwrap();

        let mut rng = XorShift128::new(97);
        for _ in 0..20 {
            let child = ordered_crossover((&a, &b), &data, &mut rng);
            assert_eq!(child.num_clients(), 6);
            assert_eq!(child.num_missing_clients(), 0);
        }
    }

    #[test]
    fn offspring_preserves_contiguous_parent_material() {
        let data = test_utils::line_problem(5, vec![VehicleType::new(1, 100)]);
        let a = Solution::new(&data, vec![(0, vec![1, 2, 3, 4, 5])]).unwrap();
        let b = Solution::new(&data, vec![(0, vec![5, 4, 3, 2, 1])]).unwrap();

        let mut rng = XorShift128::new(2);
        let child = ordered_crossover((&a, &b), &data, &mut rng);

        // Every client appears, and at least one comes from each parent's
        // ordering unless the child equals one parent outright.
        assert_eq!(child.num_clients(), 5);
    }
}
