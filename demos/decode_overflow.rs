use overflow_beacon::core::TrackerConfig;
use overflow_beacon::protocol::overflow::{encode_payload, identity_payload};
use overflow_beacon::protocol::{AdvertisementReport, IBeaconFrame, OverflowPayloadExtractor};
use overflow_beacon::{BeaconIdentity, BeaconTracker};
use std::time::Duration;

/// Overflow-area body as a receiver reports it: marker byte, header, codeword
fn overflow_body(identity: &BeaconIdentity) -> Vec<u8> {
    let payload = identity_payload(identity).expect("negative tx power");
    let mut body = vec![0x01];
    body.extend(encode_payload(&payload, 5).expect("five payload bytes"));
    body
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = TrackerConfig {
        expiration: Duration::from_secs(10),
        ..Default::default()
    };

    println!("Tracker configuration:");
    println!("- Proximity UUID: {}", config.proximity_uuid);
    println!("- Expiration: {:?}", config.expiration);
    println!("- Payload bytes: {}", config.payload_byte_count);

    // Decode one overflow area directly
    let extractor = OverflowPayloadExtractor::new(config.payload_byte_count);
    let identity = BeaconIdentity { major: 2, minor: 7777, tx_power: -59 };
    let mut body = overflow_body(&identity);
    // Damage one codeword bit in transit
    body[10] ^= 0x04;
    match extractor.identify(&body[1..]) {
        Ok(Some(found)) => println!(
            "\nDecoded overflow area: major={}, minor={}, txPower={}",
            found.major, found.minor, found.tx_power
        ),
        Ok(None) => println!("\nOverflow area carries no beacon data"),
        Err(e) => eprintln!("\nOverflow area rejected: {}", e),
    }

    let mut tracker = BeaconTracker::new(config.clone())
        .expect("valid configuration")
        .with_callback(|s| {
            println!(
                "major={}, minor={}, txPower={}, rssi={} ({:?})",
                s.major, s.minor, s.tx_power, s.rssi, s.source
            )
        });
    let intakes = tracker.start().expect("tracker starts once");

    // One scanner thread per intake path, as a Bluetooth event loop would run
    let overflow = intakes.overflow.clone();
    let overflow_scanner = std::thread::spawn(move || {
        for minor in [7777u16, 7778, 7779] {
            let identity = BeaconIdentity { major: 2, minor, tx_power: -59 };
            let report = AdvertisementReport::apple("C0:FF:EE:00:00:01", -70, overflow_body(&identity));
            if let Err(e) = overflow.handle_blocking(&report) {
                eprintln!("Overflow intake error: {}", e);
            }
        }
    });

    let ibeacon = intakes.ibeacon.clone();
    let uuid = config.proximity_uuid;
    let ibeacon_scanner = std::thread::spawn(move || {
        let frame = IBeaconFrame { uuid, major: 2, minor: 8877, tx_power: -59 };
        let report = AdvertisementReport::apple("C0:FF:EE:00:00:02", -62, frame.to_bytes());
        if let Err(e) = ibeacon.handle_blocking(&report) {
            eprintln!("iBeacon intake error: {}", e);
        }
    });

    for scanner in [overflow_scanner, ibeacon_scanner] {
        if scanner.join().is_err() {
            eprintln!("Scanner thread panicked");
        }
    }

    if let Err(e) = tracker.shutdown().await {
        eprintln!("Shutdown error: {}", e);
    }

    println!("\nNearby beacons:");
    for beacon in tracker.nearby() {
        println!("  {} rssi={} txPower={}", beacon.key, beacon.rssi, beacon.tx_power);
    }
}
