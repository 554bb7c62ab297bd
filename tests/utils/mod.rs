use raptor::model::{NetworkBuilder, SlackProvider, TransitNetwork};
use raptor::{parse_time, PositiveDuration, Time};

pub fn init() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn time(clock: &str) -> Time {
    parse_time(clock).unwrap()
}

pub const STOP_A: usize = 0;
pub const STOP_B: usize = 1;
pub const STOP_C: usize = 2;
pub const STOP_D: usize = 3;

/// One line A -> B, a 2-minute walk B -> C, one line C -> D.
#[allow(dead_code)]
pub fn two_lines_with_transfer() -> TransitNetwork {
    NetworkBuilder::new(4)
        .route(&[STOP_A, STOP_B], |route| {
            route.trip("10:00:00 10:10:00");
        })
        .route(&[STOP_C, STOP_D], |route| {
            route.trip("10:20:00 10:30:00");
        })
        .transfer(STOP_B, STOP_C, PositiveDuration::from_seconds(120))
        .build()
        .unwrap()
}

/// The constrained-transfer scenario : two routes meeting at B and C,
/// with a tight connection at B only feasible for facilitated
/// transfers.
///
/// ```text
///                    A      B      C      D
/// Route 0
///   - trip 0:      10:00  10:10  10:20
///   - trip 1:      10:05  10:15  10:25
/// Route 1
///   - trip 0:             10:15  10:30  10:40
///   - trip 1:             10:20  10:35  10:45
///   - trip 2:             10:25  10:40  10:50
///   - trip 3:             10:30  10:45  10:55
///   - trip 4:             10:35  10:50  11:00
///   - trip 5:             10:40  10:55  11:05
/// ```
#[allow(dead_code)]
pub fn constrained_transfer_network(builder_initer: impl FnOnce(NetworkBuilder) -> NetworkBuilder) -> TransitNetwork {
    let builder = NetworkBuilder::new(4)
        .station(0, &[STOP_B])
        .slack(SlackProvider::uniform(
            PositiveDuration::from_seconds(240),
            PositiveDuration::from_seconds(120),
            PositiveDuration::zero(),
        ))
        .route(&[STOP_A, STOP_B, STOP_C], |route| {
            route
                .trip("10:00:00 10:10:00 10:20:00")
                .trip("10:05:00 10:15:00 10:25:00");
        })
        .route(&[STOP_B, STOP_C, STOP_D], |route| {
            route
                .trip("10:15:00 10:30:00 10:40:00")
                .trip("10:20:00 10:35:00 10:45:00")
                .trip("10:25:00 10:40:00 10:50:00")
                .trip("10:30:00 10:45:00 10:55:00")
                .trip("10:35:00 10:50:00 11:00:00")
                .trip("10:40:00 10:55:00 11:05:00");
        });
    builder_initer(builder).build().unwrap()
}
