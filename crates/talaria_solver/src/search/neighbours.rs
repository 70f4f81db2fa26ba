use serde::{Deserialize, Serialize};

use crate::problem::ProblemData;

/// Parameters for the granular neighbour lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighbourhoodParams {
    /// Weight of the minimum wait time in the proximity measure.
    pub weight_wait_time: f64,
    /// Weight of the minimum time warp in the proximity measure.
    pub weight_time_warp: f64,
    /// Number of neighbours per client.
    pub num_neighbours: usize,
    /// Whether proximity is symmetrised before ranking.
    pub symmetric_proximity: bool,
    /// Whether the neighbour relation itself is made symmetric afterwards.
    pub symmetric_neighbours: bool,
}

impl Default for NeighbourhoodParams {
    fn default() -> Self {
        NeighbourhoodParams {
            weight_wait_time: 0.2,
            weight_time_warp: 1.0,
            num_neighbours: 40,
            symmetric_proximity: true,
            symmetric_neighbours: false,
        }
    }
}

/// Computes the granular neighbour list of every client: its `k` closest
/// other clients under a composite proximity measure blending travel
/// distance with the minimum wait time and time warp a direct trip between
/// the pair would force. Depot entries are empty. Ties break on the lower
/// location index.
pub fn compute_neighbours(data: &ProblemData, params: &NeighbourhoodParams) -> Vec<Vec<usize>> {
    let num = data.num_locations();
    let mut proximity = vec![vec![0.0f64; num]; num];

    for i in data.client_indices() {
        let client_i = data.client(i);
        for j in data.client_indices() {
            if i == j {
                continue;
            }

            let client_j = data.client(j);
            let travel = data.duration(i, j) as f64;
            let early_i = client_i.tw_early as f64;
            let late_i = client_i.tw_late as f64;
            let early_j = client_j.tw_early as f64;
            let late_j = client_j.tw_late as f64;
            let service_i = client_i.service_duration as f64;

            let min_wait = (early_j - travel - service_i - late_i).max(0.0);
            let min_warp = (early_i + service_i + travel - late_j).max(0.0);

            proximity[i][j] = data.dist(i, j) as f64
                + params.weight_wait_time * min_wait
                + params.weight_time_warp * min_warp;
        }
    }

    if params.symmetric_proximity {
        for i in data.client_indices() {
            for j in data.client_indices() {
                if i < j {
                    let symmetric = proximity[i][j].min(proximity[j][i]);
                    proximity[i][j] = symmetric;
                    proximity[j][i] = symmetric;
                }
            }
        }
    }

    let mut neighbours = vec![Vec::new(); num];
    for i in data.client_indices() {
        let mut candidates: Vec<usize> = data.client_indices().filter(|&j| j != i).collect();
        candidates.sort_by(|&a, &b| {
            proximity[i][a]
                .partial_cmp(&proximity[i][b])
                .expect("proximity is never NaN")
                .then(a.cmp(&b))
        });
        candidates.truncate(params.num_neighbours);
        neighbours[i] = candidates;
    }

    if params.symmetric_neighbours {
        let snapshot = neighbours.clone();
        for i in data.client_indices() {
            for &j in &snapshot[i] {
                if !neighbours[j].contains(&i) {
                    neighbours[j].push(i);
                }
            }
        }
        for i in data.client_indices() {
            neighbours[i].sort_unstable();
        }
    }

    neighbours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn depots_have_no_neighbours_and_never_appear() {
        let data = test_utils::ok_small();
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default());

        assert!(neighbours[0].is_empty());
        for client in data.client_indices() {
            assert!(!neighbours[client].contains(&0));
            assert!(!neighbours[client].contains(&client));
        }
    }

    #[test]
    fn num_neighbours_caps_list_length() {
        let data = test_utils::ok_small();
        let params = NeighbourhoodParams {
            num_neighbours: 2,
            ..NeighbourhoodParams::default()
        };

        let neighbours = compute_neighbours(&data, &params);
        for client in data.client_indices() {
            assert_eq!(neighbours[client].len(), 2);
        }
    }

    #[test]
    fn symmetric_neighbours_makes_the_relation_symmetric() {
        let data = test_utils::ok_small();
        let params = NeighbourhoodParams {
            num_neighbours: 1,
            symmetric_neighbours: true,
            ..NeighbourhoodParams::default()
        };

        let neighbours = compute_neighbours(&data, &params);
        for i in data.client_indices() {
            for &j in &neighbours[i] {
                assert!(neighbours[j].contains(&i));
            }
        }
    }
}
