//! The interactive menu loop.
//!
//! Each menu entry is split into three steps: prompting builds an [`Action`],
//! [`Session::execute`] applies it to the car park, and the resulting
//! [`Outcome`] is rendered. Only the first and last steps touch the terminal.

use std::path::PathBuf;

use carpark::{
    Car, CarPark, Category, Departure, ParkingError, Registration, Slot, SlotId, Snapshot,
    domain::format_elapsed,
};
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use super::{
    menu::{self, MenuChoice},
    prompt,
    terminal::{Colorize, is_narrow},
};

/// A fully-specified request against the car park.
#[derive(Debug)]
pub enum Action {
    AddSlot { id: SlotId, category: Category },
    DeleteSlot(SlotId),
    ListSlots,
    DeleteUnoccupied,
    ParkCar { slot: SlotId, car: Car },
    FindCar(Registration),
    RemoveCar(Registration),
    Save,
}

/// What an [`Action`] did.
#[derive(Debug)]
pub enum Outcome {
    SlotAdded {
        id: SlotId,
        category: Category,
    },
    SlotDeleted(SlotId),
    Listing,
    UnoccupiedDeleted(usize),
    Parked {
        slot: SlotId,
        registration: Registration,
        parked_at: String,
    },
    Found {
        slot: SlotId,
        owner: String,
        category: Category,
        parked_at: String,
        duration: String,
        fee: f64,
    },
    NotFound(Registration),
    Departed(Departure),
    Saved(PathBuf),
    SaveFailed(String),
}

pub struct Session {
    car_park: CarPark,
    data_file: PathBuf,
}

impl Session {
    pub const fn new(car_park: CarPark, data_file: PathBuf) -> Self {
        Self {
            car_park,
            data_file,
        }
    }

    /// Shows the menu until the user picks "Exit".
    pub fn run(mut self) -> anyhow::Result<()> {
        loop {
            menu::print_menu();
            let choice = prompt::menu_choice()?;
            if choice == MenuChoice::Exit {
                println!("\nThank you for using the car park manager!");
                return Ok(());
            }

            if let Some(action) = self.prompt_action(choice)? {
                match self.execute(action) {
                    Ok(outcome) => self.render(&outcome),
                    Err(error) => {
                        warn!(code = error.code(), %error, "command refused");
                        println!("{}", format!("Error [{}]: {error}", error.code()).warning());
                    }
                }
            }

            prompt::pause()?;
        }
    }

    /// Gathers the input for a menu entry.
    ///
    /// Returns `None` when there is nothing to do.
    fn prompt_action(&self, choice: MenuChoice) -> anyhow::Result<Option<Action>> {
        println!("\n--- {} ---", choice.label());
        let action = match choice {
            MenuChoice::AddSlot => {
                let id = prompt::slot_id("Enter slot ID (e.g., D01)")?;
                let staff = prompt::yes_no("Is this a staff slot? (y/n)")?;
                let category = Slot::inferred_category(&id, Category::from_staff_flag(staff));
                Action::AddSlot { id, category }
            }
            MenuChoice::DeleteSlot => {
                if self.no_slots() {
                    return Ok(None);
                }
                Action::DeleteSlot(prompt::slot_id("Enter slot ID to delete")?)
            }
            MenuChoice::ListSlots => Action::ListSlots,
            MenuChoice::DeleteUnoccupied => Action::DeleteUnoccupied,
            MenuChoice::ParkCar => {
                if self.no_slots() {
                    return Ok(None);
                }
                let slot = prompt::slot_id("Enter slot ID")?;
                let registration = prompt::registration("Enter registration (e.g., T1234)")?;
                let owner = prompt::owner_name("Enter owner name")?;
                let staff = prompt::yes_no("Is owner a staff member? (y/n)")?;
                let car = Car::new(registration, owner, Category::from_staff_flag(staff));
                Action::ParkCar { slot, car }
            }
            MenuChoice::FindCar => {
                Action::FindCar(prompt::registration("Enter registration to find")?)
            }
            MenuChoice::RemoveCar => {
                Action::RemoveCar(prompt::registration("Enter registration to remove")?)
            }
            MenuChoice::Save => Action::Save,
            MenuChoice::Exit => return Ok(None),
        };
        Ok(Some(action))
    }

    fn no_slots(&self) -> bool {
        let empty = self.car_park.total_slots() == 0;
        if empty {
            println!("No slots available.");
        }
        empty
    }

    /// Applies an action to the car park.
    ///
    /// A failed save is reported as [`Outcome::SaveFailed`] rather than an
    /// error, since it leaves the car park untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, action: Action) -> Result<Outcome, ParkingError> {
        let outcome = match action {
            Action::AddSlot { id, category } => {
                self.car_park.create_slot(id.clone(), category)?;
                Outcome::SlotAdded { id, category }
            }
            Action::DeleteSlot(id) => {
                self.car_park.remove_slot(&id)?;
                Outcome::SlotDeleted(id)
            }
            Action::ListSlots => Outcome::Listing,
            Action::DeleteUnoccupied => {
                Outcome::UnoccupiedDeleted(self.car_park.remove_all_unoccupied_slots())
            }
            Action::ParkCar { slot, car } => {
                let registration = car.registration().clone();
                let parked = self.car_park.park_car(&slot, car)?;
                let parked_at = parked
                    .car()
                    .and_then(Car::formatted_parked_at)
                    .unwrap_or_default();
                Outcome::Parked {
                    slot,
                    registration,
                    parked_at,
                }
            }
            Action::FindCar(registration) => self.find(registration, Utc::now()),
            Action::RemoveCar(registration) => {
                Outcome::Departed(self.car_park.remove_car(&registration)?)
            }
            Action::Save => self.save(Utc::now()),
        };
        Ok(outcome)
    }

    fn find(&self, registration: Registration, now: DateTime<Utc>) -> Outcome {
        let Some(slot) = self.car_park.find_by_registration(&registration) else {
            return Outcome::NotFound(registration);
        };
        let Some(car) = slot.car() else {
            return Outcome::NotFound(registration);
        };
        Outcome::Found {
            slot: slot.id().clone(),
            owner: car.owner().to_string(),
            category: car.category(),
            parked_at: car.formatted_parked_at().unwrap_or_default(),
            duration: format_elapsed(car.elapsed_at(now)),
            fee: slot.calculate_fee_at(now),
        }
    }

    fn save(&self, now: DateTime<Utc>) -> Outcome {
        match Snapshot::capture(&self.car_park, now).save(&self.data_file) {
            Ok(()) => {
                info!(path = %self.data_file.display(), "car park saved");
                Outcome::Saved(self.data_file.clone())
            }
            Err(e) => {
                error!(path = %self.data_file.display(), error = %e, "save failed");
                Outcome::SaveFailed(e.to_string())
            }
        }
    }

    fn render(&self, outcome: &Outcome) {
        match outcome {
            Outcome::SlotAdded { id, category } => {
                println!("{}", format!("✓ Added {category} slot: {id}").success());
            }
            Outcome::SlotDeleted(id) => {
                println!("{}", format!("✓ Deleted slot: {id}").success());
            }
            Outcome::Listing => self.print_slots(),
            Outcome::UnoccupiedDeleted(count) => {
                println!(
                    "{}",
                    format!("✓ Removed {count} unoccupied slot(s)").success()
                );
            }
            Outcome::Parked {
                slot,
                registration,
                parked_at,
            } => {
                println!(
                    "{}",
                    format!("✓ Parked {registration} in slot {slot}").success()
                );
                println!("  Parking time: {parked_at}");
            }
            Outcome::Found {
                slot,
                owner,
                category,
                parked_at,
                duration,
                fee,
            } => {
                println!("{}", format!("✓ Found in slot {slot}").success());
                println!("  Owner: {owner} ({category})");
                println!("  Parked at: {parked_at}");
                println!("  Duration: {duration}");
                println!("  Current fee: ${fee:.2}");
            }
            Outcome::NotFound(registration) => println!("Car {registration} not found."),
            Outcome::Departed(departure) => {
                println!(
                    "{}",
                    format!(
                        "✓ Removed {} (Owner: {})",
                        departure.car.registration(),
                        departure.car.owner()
                    )
                    .success()
                );
                println!("  Total fee charged: ${:.2}", departure.fee);
            }
            Outcome::Saved(path) => {
                println!(
                    "{}",
                    format!("✓ Data saved to {}", path.display()).success()
                );
            }
            Outcome::SaveFailed(message) => {
                println!("{}", format!("Error saving data: {message}").warning());
            }
        }
    }

    fn print_slots(&self) {
        if self.car_park.total_slots() == 0 {
            println!("No slots available.");
            return;
        }
        println!(
            "Total: {} | Occupied: {} | Available: {}\n",
            self.car_park.total_slots(),
            self.car_park.occupied_count(),
            self.car_park.available_count()
        );
        let narrow = is_narrow();
        for slot in self.car_park.slots() {
            println!("  {}", slot_line(slot, narrow));
        }
    }
}

/// One line of the slot listing.
///
/// Narrow terminals get the slot ID, category and registration only.
fn slot_line(slot: &Slot, narrow: bool) -> String {
    if narrow {
        let occupant = slot
            .car()
            .map_or("-", |car| car.registration().as_str());
        return format!("{} {:<7} {occupant}", slot.id(), slot.category());
    }
    format!(
        "[{}] {slot} (Rate: ${:.2}/hr)",
        slot.category().label().to_uppercase(),
        slot.hourly_rate()
    )
}
