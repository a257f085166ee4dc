//! Property tests for the admission rule and battery degradation.

use fleet_core::{BatteryLevel, DroneId, DroneModel, MedicationCode, MedicationName, SerialNumber, Weight};
use fleet_state::{
    evaluate, AdmissionError, DegradationPass, Drone, DroneError, MedicationItem, NewDrone,
};
use proptest::prelude::*;

fn drone(battery: u8, limit: u32) -> Drone {
    Drone::register(
        DroneId::new(1).unwrap(),
        NewDrone::new(
            SerialNumber::new("SN-PROP-000001").unwrap(),
            DroneModel::Heavyweight,
            Weight::grams(limit),
        )
        .with_battery(BatteryLevel::new(i64::from(battery)).unwrap()),
    )
}

fn item(code: &str, grams: u32) -> MedicationItem {
    MedicationItem {
        name: MedicationName::new(format!("item_{code}")).unwrap(),
        code: MedicationCode::new(code).unwrap(),
        weight: Weight::grams(grams),
        image: None,
    }
}

proptest! {
    #[test]
    fn battery_after_n_ticks_never_drops_below_floor(initial in 0u8..=100, ticks in 0usize..150) {
        let mut fleet = vec![drone(initial, 300)];
        for _ in 0..ticks {
            let pass = DegradationPass::compute(&fleet);
            for updated in pass.updated {
                fleet[0] = updated;
            }
        }
        let expected = if initial <= 1 {
            initial
        } else {
            (i64::from(initial) - ticks as i64).max(1) as u8
        };
        prop_assert_eq!(fleet[0].battery().percent(), expected);
    }

    #[test]
    fn low_battery_always_refused(
        battery in 0u8..25,
        limit in 10u32..=500,
        payload in 0u32..=500,
        candidate in 1u32..=500,
    ) {
        let result = evaluate(
            BatteryLevel::new(i64::from(battery)).unwrap(),
            Weight::grams(limit),
            Weight::grams(payload),
            Weight::grams(candidate),
        );
        let refused_for_battery = matches!(result, Err(AdmissionError::InsufficientBattery { .. }));
        prop_assert!(refused_for_battery);
    }

    #[test]
    fn overweight_refused_and_drone_unchanged(
        battery in 25u8..=100,
        limit in 10u32..=500,
        extra in 1u32..=500,
    ) {
        let mut d = drone(battery, limit);
        let before = d.clone();
        let result = d.load(item("OVER", limit + extra));
        let refused_for_capacity = matches!(
            result,
            Err(DroneError::Admission(AdmissionError::CapacityExceeded { .. }))
        );
        prop_assert!(refused_for_capacity);
        prop_assert_eq!(d, before);
    }

    #[test]
    fn load_order_does_not_change_contents(a in 1u32..=250, b in 1u32..=250) {
        let mut ab = drone(100, 500);
        ab.load(item("A", a)).unwrap();
        ab.load(item("B", b)).unwrap();

        let mut ba = drone(100, 500);
        ba.load(item("B", b)).unwrap();
        ba.load(item("A", a)).unwrap();

        let mut codes_ab: Vec<_> = ab.medications().iter().map(|m| m.code.clone()).collect();
        let mut codes_ba: Vec<_> = ba.medications().iter().map(|m| m.code.clone()).collect();
        codes_ab.sort();
        codes_ba.sort();
        prop_assert_eq!(codes_ab, codes_ba);
        prop_assert_eq!(ab.current_payload(), ba.current_payload());
        prop_assert_eq!(ab.state(), ba.state());
    }
}
