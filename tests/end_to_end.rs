//! End-to-end scenarios against the public car park API.

use carpark::{Car, CarPark, Category, ParkingError, Registration, SlotId};
use chrono::{TimeDelta, Utc};
use non_empty_string::NonEmptyString;

fn id(s: &str) -> SlotId {
    s.parse().unwrap()
}

fn reg(s: &str) -> Registration {
    s.parse().unwrap()
}

fn john(registration: &str) -> Car {
    Car::new(
        reg(registration),
        NonEmptyString::new("John".to_string()).unwrap(),
        Category::Staff,
    )
}

#[test]
fn staff_car_lifecycle() {
    let mut car_park = CarPark::new();
    car_park.create_slot(id("S01"), Category::Staff).unwrap();
    car_park.create_slot(id("V01"), Category::Visitor).unwrap();
    assert!((car_park.slot(&id("S01")).unwrap().hourly_rate() - 3.0).abs() < f64::EPSILON);
    assert!((car_park.slot(&id("V01")).unwrap().hourly_rate() - 5.0).abs() < f64::EPSILON);

    car_park.park_car(&id("S01"), john("A1234")).unwrap();
    assert!(car_park.slot(&id("S01")).unwrap().is_occupied());

    let error = car_park.park_car(&id("V01"), john("A1234")).unwrap_err();
    assert_eq!(error, ParkingError::DuplicateCar(reg("A1234")));
    assert!(!car_park.slot(&id("V01")).unwrap().is_occupied());

    let departure = car_park.remove_car(&reg("A1234")).unwrap();
    assert!(departure.fee >= 3.0);
    assert_eq!(departure.car.owner(), "John");
    assert!(!car_park.slot(&id("S01")).unwrap().is_occupied());
    assert!(car_park.find_by_registration(&reg("A1234")).is_none());

    assert_eq!(car_park.remove_all_unoccupied_slots(), 2);
    assert_eq!(car_park.total_slots(), 0);
}

#[test]
fn long_stay_is_billed_in_whole_hours() {
    let mut car_park = CarPark::new();
    car_park.populate(1, 0).unwrap();

    let arrived = Utc::now() - TimeDelta::minutes(130);
    car_park.park_car_at(&id("S01"), john("A1234"), arrived).unwrap();

    let departure = car_park
        .remove_car_at(&reg("A1234"), arrived + TimeDelta::minutes(130))
        .unwrap();
    assert!((departure.fee - 6.0).abs() < f64::EPSILON);
    assert_eq!(departure.duration, TimeDelta::minutes(130));
}
