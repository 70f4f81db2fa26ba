use thiserror::Error;

use crate::problem::{
    Client, Depot, Location, Matrix, VehicleType,
    measure::{self, Distance, Duration},
};

#[derive(Error, Debug)]
pub enum ProblemError {
    #[error("there must be at least one depot")]
    NoDepots,
    #[error("there must be at least one vehicle type")]
    NoVehicleTypes,
    #[error("{name} matrix has size {actual}, expected {expected} locations")]
    MatrixShape {
        name: &'static str,
        actual: usize,
        expected: usize,
    },
    #[error("{name} matrix contains a negative value")]
    NegativeMatrixEntry { name: &'static str },
    #[error("location {location} has tw_early > tw_late")]
    InvalidTimeWindow { location: usize },
    #[error("client {location} has release_time > tw_late")]
    InvalidReleaseTime { location: usize },
    #[error("client {location} has a negative demand or service duration")]
    NegativeClientValue { location: usize },
    #[error("vehicle type {vehicle_type} references depot {depot}, but there are {num_depots} depots")]
    DepotOutOfRange {
        vehicle_type: usize,
        depot: usize,
        num_depots: usize,
    },
    #[error("vehicle type {vehicle_type} has tw_early > tw_late")]
    InvalidShiftWindow { vehicle_type: usize },
}

/// Immutable description of a problem instance: depots, clients, the fleet,
/// and the travel matrices. Locations are indexed such that depots occupy
/// `[0, num_depots)` and clients `[num_depots, num_locations)`.
pub struct ProblemData {
    depots: Vec<Depot>,
    clients: Vec<Client>,
    vehicle_types: Vec<VehicleType>,
    distance_matrix: Matrix<Distance>,
    duration_matrix: Matrix<Duration>,
    num_vehicles: usize,
}

impl ProblemData {
    pub fn new(
        clients: Vec<Client>,
        depots: Vec<Depot>,
        vehicle_types: Vec<VehicleType>,
        distance_matrix: Matrix<Distance>,
        duration_matrix: Matrix<Duration>,
    ) -> Result<Self, ProblemError> {
        if depots.is_empty() {
            return Err(ProblemError::NoDepots);
        }

        if vehicle_types.is_empty() {
            return Err(ProblemError::NoVehicleTypes);
        }

        let num_locations = depots.len() + clients.len();
        for (name, size) in [
            ("distance", distance_matrix.size()),
            ("duration", duration_matrix.size()),
        ] {
            if size != num_locations {
                return Err(ProblemError::MatrixShape {
                    name,
                    actual: size,
                    expected: num_locations,
                });
            }
        }

        if distance_matrix.values().iter().any(|&d| d < measure::ZERO) {
            return Err(ProblemError::NegativeMatrixEntry { name: "distance" });
        }

        if duration_matrix.values().iter().any(|&d| d < measure::ZERO) {
            return Err(ProblemError::NegativeMatrixEntry { name: "duration" });
        }

        for (idx, depot) in depots.iter().enumerate() {
            if depot.tw_early > depot.tw_late {
                return Err(ProblemError::InvalidTimeWindow { location: idx });
            }
        }

        for (idx, client) in clients.iter().enumerate() {
            let location = depots.len() + idx;
            if client.tw_early > client.tw_late {
                return Err(ProblemError::InvalidTimeWindow { location });
            }

            if client.release_time > client.tw_late {
                return Err(ProblemError::InvalidReleaseTime { location });
            }

            if client.delivery < measure::ZERO
                || client.pickup < measure::ZERO
                || client.service_duration < measure::ZERO
            {
                return Err(ProblemError::NegativeClientValue { location });
            }
        }

        for (idx, vehicle_type) in vehicle_types.iter().enumerate() {
            if vehicle_type.depot >= depots.len() {
                return Err(ProblemError::DepotOutOfRange {
                    vehicle_type: idx,
                    depot: vehicle_type.depot,
                    num_depots: depots.len(),
                });
            }

            if vehicle_type.tw_early > vehicle_type.tw_late {
                return Err(ProblemError::InvalidShiftWindow { vehicle_type: idx });
            }
        }

        let num_vehicles = vehicle_types.iter().map(|vt| vt.num_available).sum();

        Ok(ProblemData {
            depots,
            clients,
            vehicle_types,
            distance_matrix,
            duration_matrix,
            num_vehicles,
        })
    }

    pub fn num_depots(&self) -> usize {
        self.depots.len()
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn num_locations(&self) -> usize {
        self.depots.len() + self.clients.len()
    }

    pub fn num_vehicle_types(&self) -> usize {
        self.vehicle_types.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// The client or depot at the given location index. Panics when the index
    /// is out of range.
    pub fn location(&self, idx: usize) -> Location<'_> {
        if idx < self.depots.len() {
            Location::Depot(&self.depots[idx])
        } else {
            Location::Client(&self.clients[idx - self.depots.len()])
        }
    }

    /// The client at the given location index. Panics when the index refers
    /// to a depot or is out of range.
    pub fn client(&self, idx: usize) -> &Client {
        assert!(idx >= self.depots.len(), "location {idx} is a depot");
        &self.clients[idx - self.depots.len()]
    }

    pub fn depot(&self, idx: usize) -> &Depot {
        &self.depots[idx]
    }

    pub fn vehicle_type(&self, idx: usize) -> &VehicleType {
        &self.vehicle_types[idx]
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    /// Iterates over client location indices, `num_depots..num_locations`.
    pub fn client_indices(&self) -> std::ops::Range<usize> {
        self.depots.len()..self.num_locations()
    }

    pub fn dist(&self, from: usize, to: usize) -> Distance {
        self.distance_matrix[(from, to)]
    }

    pub fn duration(&self, from: usize, to: usize) -> Duration {
        self.duration_matrix[(from, to)]
    }

    pub fn distance_matrix(&self) -> &Matrix<Distance> {
        &self.distance_matrix
    }

    pub fn duration_matrix(&self) -> &Matrix<Duration> {
        &self.duration_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::measure;

    fn square(n: usize) -> Matrix<Distance> {
        Matrix::new(n)
    }

    #[test]
    fn rejects_wrongly_sized_matrices() {
        let result = ProblemData::new(
            vec![Client::new(1, 1)],
            vec![Depot::new(0, 0)],
            vec![VehicleType::new(1, measure::ZERO)],
            square(3),
            square(2),
        );

        assert!(matches!(
            result,
            Err(ProblemError::MatrixShape { name: "distance", .. })
        ));
    }

    #[test]
    fn rejects_inverted_time_window() {
        let mut client = Client::new(1, 1);
        client.tw_early = 10;
        client.tw_late = 5;

        let result = ProblemData::new(
            vec![client],
            vec![Depot::new(0, 0)],
            vec![VehicleType::new(1, measure::ZERO)],
            square(2),
            square(2),
        );

        assert!(matches!(
            result,
            Err(ProblemError::InvalidTimeWindow { location: 1 })
        ));
    }

    #[test]
    fn rejects_depot_out_of_range() {
        let mut vehicle_type = VehicleType::new(1, measure::ZERO);
        vehicle_type.depot = 1;

        let result = ProblemData::new(
            vec![Client::new(1, 1)],
            vec![Depot::new(0, 0)],
            vec![vehicle_type],
            square(2),
            square(2),
        );

        assert!(matches!(result, Err(ProblemError::DepotOutOfRange { .. })));
    }

    #[test]
    fn location_views_depots_and_clients() {
        let mut client = Client::new(3, 4);
        client.delivery = 5;

        let data = ProblemData::new(
            vec![client],
            vec![Depot::new(0, 0)],
            vec![VehicleType::new(1, 10)],
            square(2),
            square(2),
        )
        .unwrap();

        assert_eq!(data.num_locations(), 2);
        assert_eq!(data.location(0).delivery(), measure::ZERO);
        assert_eq!(data.location(1).delivery(), 5);
        assert_eq!(data.client(1).delivery, 5);
    }
}
