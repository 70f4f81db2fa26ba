use crate::problem::{
    Client, Depot, Matrix, ProblemData, VehicleType,
    measure::{Coordinate, Distance, Duration},
};

/// Builds problem data from parts, with the duration matrix equal to the
/// distance matrix.
pub fn create_problem(
    clients: Vec<Client>,
    depots: Vec<Depot>,
    vehicle_types: Vec<VehicleType>,
    distances: Vec<Vec<Distance>>,
) -> ProblemData {
    let distance_matrix = Matrix::from_rows(distances).expect("square matrix");
    let duration_matrix = distance_matrix.clone();

    ProblemData::new(clients, depots, vehicle_types, distance_matrix, duration_matrix)
        .expect("valid test problem")
}

/// Pairwise Manhattan distances over the given coordinates.
pub fn manhattan_matrix(coords: &[(Coordinate, Coordinate)]) -> Vec<Vec<Distance>> {
    coords
        .iter()
        .map(|&(x1, y1)| {
            coords
                .iter()
                .map(|&(x2, y2)| {
                    let dx = if x1 > x2 { x1 - x2 } else { x2 - x1 };
                    let dy = if y1 > y2 { y1 - y2 } else { y2 - y1 };
                    dx + dy
                })
                .collect()
        })
        .collect()
}

/// A small instance with one depot, four clients and three vehicles of
/// capacity ten, tight enough that most moves matter. Durations equal
/// distances.
pub fn ok_small() -> ProblemData {
    let depot = Depot {
        tw_early: 0,
        tw_late: 45000,
        ..Depot::new(2334, 726)
    };

    let coords = [(226, 1297), (590, 530), (435, 718), (1191, 639)];
    let demands = [5, 5, 3, 5];
    let windows = [(15600, 22500), (12000, 19500), (8400, 15300), (12000, 19500)];

    let clients = coords
        .iter()
        .zip(demands)
        .zip(windows)
        .map(|((&(x, y), delivery), (tw_early, tw_late))| Client {
            delivery,
            service_duration: 360,
            tw_early,
            tw_late,
            ..Client::new(x, y)
        })
        .collect();

    let matrix: Vec<Vec<Duration>> = vec![
        vec![0, 1544, 1944, 1931, 1476],
        vec![1726, 0, 1992, 1427, 1593],
        vec![1965, 1975, 0, 621, 1090],
        vec![2063, 1433, 647, 0, 818],
        vec![1475, 1594, 1090, 828, 0],
    ];

    create_problem(
        clients,
        vec![depot],
        vec![VehicleType::new(3, 10)],
        matrix,
    )
}

/// Four clients on a line with simultaneous pickup and delivery: the big
/// delivery and the big pickup make the peak load depend strongly on visit
/// order, so reordering moves must account for it. Two vehicles of
/// capacity ten.
pub fn mixed_load_problem() -> ProblemData {
    let coords: Vec<(Coordinate, Coordinate)> =
        (0..=4).map(|i| (i as Coordinate, 0)).collect();

    let demands = [(8, 0), (0, 8), (2, 0), (0, 2)];
    let clients = coords[1..]
        .iter()
        .zip(demands)
        .map(|(&(x, y), (delivery, pickup))| Client {
            delivery,
            pickup,
            ..Client::new(x, y)
        })
        .collect();

    create_problem(
        clients,
        vec![Depot::new(0, 0)],
        vec![VehicleType::new(2, 10)],
        manhattan_matrix(&coords),
    )
}

/// Clients on a line at unit spacing with the depot at the origin; every
/// distance is the coordinate difference. Useful when a test needs obvious
/// geometry.
pub fn line_problem(num_clients: usize, vehicle_types: Vec<VehicleType>) -> ProblemData {
    let coords: Vec<(Coordinate, Coordinate)> =
        (0..=num_clients).map(|i| (i as Coordinate, 0)).collect();

    let clients = coords[1..]
        .iter()
        .map(|&(x, y)| Client::new(x, y))
        .collect();

    create_problem(
        clients,
        vec![Depot::new(0, 0)],
        vehicle_types,
        manhattan_matrix(&coords),
    )
}
