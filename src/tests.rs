// End-to-end scenarios across the catalog, the propagator and the converters

const ISS_LINE_1: &str = "1 25544U 98067A   24340.99323416 +.00018216  00000 0  32316-3 0 0999";
const ISS_LINE_2: &str = "2 25544  51.6388 184.2057 0007028 306.7642 201.1123 15.5026597648519";

const VANGUARD_LINE_1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
const VANGUARD_LINE_2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

#[cfg(test)]
mod tle_tests {
    use super::*;
    use crate::tle::{ElementRecord, TleField};
    use crate::Error;

    #[test]
    fn test_parse_encode_parse_is_stable() {
        let record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let (line1, line2) = record.lines().unwrap();
        assert_eq!(line1, ISS_LINE_1);
        assert_eq!(line2, ISS_LINE_2);
        assert_eq!(ElementRecord::parse(&line1, &line2).unwrap(), record);
    }

    #[test]
    fn test_field_table_locates_values() {
        assert_eq!(TleField::Inclination.slice(ISS_LINE_2).ok().map(str::trim), Some("51.6388"));
        assert_eq!(TleField::Designator.slice(ISS_LINE_1).ok().map(str::trim), Some("98067A"));
    }

    #[test]
    fn test_identifier_out_of_range_is_validation_fault() {
        let mut record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let err = record.set_satellite_id(340_000).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "satellite_id", .. }));
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_record_serializes_with_model_tag() {
        let record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["perturbations"]["model"], "sgp");
        let back: ElementRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}

#[cfg(test)]
mod catalog_tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Catalog, EarthModel, ElementRecord, Error, PropagationEngine};

    fn record(satellite_id: u32) -> ElementRecord {
        let mut record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        record.set_satellite_id(satellite_id).unwrap();
        record
    }

    #[test]
    fn test_count_tracks_inserts_and_removes() {
        let catalog = Catalog::new();
        let keys: Vec<_> = (1..=5).map(|id| catalog.insert(&record(id)).unwrap()).collect();
        catalog.remove(keys[1]);
        catalog.remove(keys[3]);
        catalog.remove(keys[3]);
        assert_eq!(catalog.count(), 3);
        assert_eq!(catalog.list_keys(), vec![keys[0], keys[2], keys[4]]);
    }

    #[test]
    fn test_validation_happens_before_registry_changes() {
        let engine = PropagationEngine::new(Arc::new(Catalog::new()), EarthModel::Wgs72);
        let mut value = serde_json::to_value(record(1)).unwrap();
        value["satellite_id"] = serde_json::json!(340_000);
        let bad: ElementRecord = serde_json::from_value(value).unwrap();

        let err = engine.state_at(&bad, bad.epoch).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(engine.catalog().count(), 0);
    }

    #[test]
    fn test_shared_catalog_across_engines() {
        let catalog = Arc::new(Catalog::new());
        let wgs72 = PropagationEngine::new(Arc::clone(&catalog), EarthModel::Wgs72);
        let key = wgs72.load(&record(25544)).unwrap();
        assert_eq!(catalog.key_of(25544), Some(key));
        assert!(matches!(
            wgs72.load(&record(25544)),
            Err(Error::DuplicateKey { satellite_id: 25544 })
        ));
    }

    #[test]
    fn test_catalog_file_round_trip() {
        let catalog = Catalog::new();
        catalog.insert(&record(25544)).unwrap();
        catalog.insert(&ElementRecord::parse(VANGUARD_LINE_1, VANGUARD_LINE_2).unwrap()).unwrap();

        let path = std::env::temp_dir().join(format!("orbital-catalog-{}.tle", std::process::id()));
        catalog.write_catalog_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        let reloaded: Vec<ElementRecord> = lines
            .chunks(2)
            .map(|pair| ElementRecord::parse(pair[0], pair[1]).unwrap())
            .collect();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].satellite_id(), 25544);
        assert_eq!(reloaded[1].satellite_id(), 5);
    }
}

#[cfg(test)]
mod propagation_tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Catalog, EarthModel, ElementRecord, PropagationEngine};

    fn engine() -> PropagationEngine {
        PropagationEngine::new(Arc::new(Catalog::new()), EarthModel::Wgs72)
    }

    #[test]
    fn test_iss_one_day_after_epoch() {
        let engine = engine();
        let record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let key = engine.load(&record).unwrap();
        let state = engine.propagate(key, record.epoch.plus_days(1.0)).unwrap();

        let expected_position = [-6000.682447771027, 2024.4265984573651, -2456.1508465967677];
        let expected_velocity = [-3.5882907116585194, -4.171760080775311, 5.333708174720774];
        for axis in 0..3 {
            assert!(
                (state.cartesian.position[axis] - expected_position[axis]).abs() < 2e-3,
                "position axis {axis}: {}",
                state.cartesian.position[axis]
            );
            assert!(
                (state.cartesian.velocity[axis] - expected_velocity[axis]).abs() < 1e-5,
                "velocity axis {axis}: {}",
                state.cartesian.velocity[axis]
            );
        }
        assert!((state.minutes_since_epoch - 1440.0).abs() < 1e-6);
        assert!(state.revolution_number >= 48_519 + 15);
        assert!(state.revolution_number <= 48_519 + 16);
    }

    #[test]
    fn test_repeated_propagation_is_bit_identical() {
        let engine = engine();
        let record = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let key = engine.load(&record).unwrap();
        let epoch = record.epoch.plus_minutes(4321.0);
        let first = engine.propagate(key, epoch).unwrap();
        for _ in 0..5 {
            assert_eq!(engine.propagate(key, epoch).unwrap(), first);
        }
    }

    #[test]
    fn test_range_length_and_order() {
        let engine = engine();
        let record = ElementRecord::parse(VANGUARD_LINE_1, VANGUARD_LINE_2).unwrap();
        let key = engine.load(&record).unwrap();
        let start = record.epoch;
        let stop = start.plus_minutes(720.0);
        let ephemeris = engine.propagate_range(key, start, stop, 37.0 * 60.0).unwrap();
        assert_eq!(ephemeris.len(), (720.0f64 / 37.0).floor() as usize + 1);
        assert!(ephemeris
            .states()
            .windows(2)
            .all(|pair| pair[0].epoch < pair[1].epoch));
    }

    #[test]
    fn test_matches_reference_sgp4_crate() {
        let elements = ::sgp4::Elements::from_tle(
            None,
            VANGUARD_LINE_1.as_bytes(),
            VANGUARD_LINE_2.as_bytes(),
        )
        .unwrap();
        let reference = ::sgp4::Constants::from_elements_afspc_compatibility_mode(&elements).unwrap();

        let engine = engine();
        let record = ElementRecord::parse(VANGUARD_LINE_1, VANGUARD_LINE_2).unwrap();
        let key = engine.load(&record).unwrap();

        for minutes in [0.0, 120.0, 360.0, 1440.0, 4320.0] {
            let expected = reference.propagate(minutes).unwrap();
            let state = engine.propagate(key, record.epoch.plus_minutes(minutes)).unwrap();
            for axis in 0..3 {
                assert!(
                    (state.cartesian.position[axis] - expected.position[axis]).abs() < 1e-5,
                    "t={minutes} position axis {axis}"
                );
                assert!(
                    (state.cartesian.velocity[axis] - expected.velocity[axis]).abs() < 1e-8,
                    "t={minutes} velocity axis {axis}"
                );
            }
        }
    }

    #[test]
    fn test_relative_state_between_catalog_objects() {
        let engine = engine();
        let iss = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let mut chaser = iss.clone();
        chaser.set_satellite_id(99_999).unwrap();
        chaser.set_mean_anomaly(iss.mean_anomaly() + 0.01).unwrap();

        let epoch = iss.epoch.plus_minutes(30.0);
        let a = engine.state_at(&iss, epoch).unwrap();
        let b = engine.state_at(&chaser, epoch).unwrap();
        let relative = crate::RelativeState::between(&a, &b).unwrap();
        assert!(relative.range > 0.5 && relative.range < 2.0, "range {}", relative.range);
        assert!(relative.in_track_position > 0.0);
        assert!(relative.plane < 0.01, "plane {}", relative.plane);
    }

    #[test]
    fn test_relative_state_requires_common_epoch() {
        let engine = engine();
        let iss = ElementRecord::parse(ISS_LINE_1, ISS_LINE_2).unwrap();
        let now = engine.state_at(&iss, iss.epoch.plus_minutes(30.0)).unwrap();
        let later = engine.state_at(&iss, iss.epoch.plus_minutes(31.0)).unwrap();
        assert!(matches!(
            crate::RelativeState::between(&now, &later),
            Err(crate::Error::Validation { field: "epoch", .. })
        ));
    }
}

#[cfg(test)]
mod conversion_tests {
    use crate::{ElementConverter, KeplerianElements};

    #[test]
    fn test_cartesian_round_trip_recovers_shape() {
        let converter = ElementConverter::default();
        for (a, e, i) in [(6800.0, 0.001, 51.6), (26_560.0, 0.7, 63.4), (42_164.0, 0.0001, 5.0)] {
            let kep = KeplerianElements::new(a, e, i, 75.0, 30.0, 120.0);
            let cart = converter.cartesian_from_keplerian(&kep).unwrap();
            let back = converter.keplerian_from_cartesian(&cart).unwrap();
            assert!(((back.semi_major_axis - a) / a).abs() < 1e-6);
            assert!((back.eccentricity - e).abs() < 1e-6 * e.max(1e-3));
            assert!(((back.inclination - i) / i).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mean_elements_of_geostationary_fixture() {
        let converter = ElementConverter::default();
        let kep = KeplerianElements::new(42164.0, 0.0001, 0.42, 42.0, 200.0, 300.0);
        let mean = converter
            .mean_from_keplerian(&kep, crate::Epoch::from_ds50(27368.5))
            .unwrap();
        let longitude = (mean.mean_anomaly + mean.argument_of_perigee + mean.raan).rem_euclid(360.0);
        assert!((longitude - 182.0).abs() < 0.5, "mean longitude {longitude}");
    }
}
