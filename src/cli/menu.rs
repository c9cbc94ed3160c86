use super::terminal::Colorize;

/// The numbered entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddSlot,
    DeleteSlot,
    ListSlots,
    DeleteUnoccupied,
    ParkCar,
    FindCar,
    RemoveCar,
    Save,
    Exit,
}

impl MenuChoice {
    /// Menu order; entry `n` is at index `n - 1`.
    pub const ALL: [Self; 9] = [
        Self::AddSlot,
        Self::DeleteSlot,
        Self::ListSlots,
        Self::DeleteUnoccupied,
        Self::ParkCar,
        Self::FindCar,
        Self::RemoveCar,
        Self::Save,
        Self::Exit,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::AddSlot => "Add a parking slot",
            Self::DeleteSlot => "Delete a parking slot",
            Self::ListSlots => "List all slots",
            Self::DeleteUnoccupied => "Delete all unoccupied slots",
            Self::ParkCar => "Park a car",
            Self::FindCar => "Find a car",
            Self::RemoveCar => "Remove a car",
            Self::Save => "Save data",
            Self::Exit => "Exit",
        }
    }

    /// Parses a menu number such as `"5"`.
    pub fn parse(input: &str) -> Option<Self> {
        let n: usize = input.trim().parse().ok()?;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }
}

pub fn print_banner() {
    println!("{}", "=== CAR PARK MANAGEMENT ===".heading());
}

pub fn print_menu() {
    println!("\n{}", "MAIN MENU".heading());
    for (n, choice) in MenuChoice::ALL.iter().enumerate() {
        println!("  {}. {}", n + 1, choice.label());
    }
}
