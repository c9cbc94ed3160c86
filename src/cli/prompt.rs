//! Line-based prompts that re-ask until the answer is well formed.

use anyhow::anyhow;
use carpark::{Registration, SlotId, domain::car_park::MAX_SLOTS_PER_CATEGORY};
use dialoguer::Input;
use non_empty_string::NonEmptyString;

use super::menu::MenuChoice;

const SLOT_ID_HINT: &str = "Invalid format. Use: Letter + 2 digits (e.g., D01)";
const REGISTRATION_HINT: &str = "Invalid format. Use: Letter + 4 digits (e.g., T1234)";

/// Identifiers are accepted in any case and with surrounding whitespace.
pub fn normalise(input: &str) -> String {
    input.trim().to_uppercase()
}

pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_slot_count(input: &str) -> Option<usize> {
    input
        .trim()
        .parse()
        .ok()
        .filter(|n| (1..=MAX_SLOTS_PER_CATEGORY).contains(n))
}

/// Asks until `parse` accepts the answer, showing `hint` after each refusal.
fn ask<T>(prompt: &str, hint: &str, parse: impl Fn(&str) -> Option<T>) -> anyhow::Result<T> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), String> {
            parse(input.as_str()).map(drop).ok_or_else(|| hint.to_string())
        })
        .interact_text()?;
    parse(input.as_str()).ok_or_else(|| anyhow!("{hint}"))
}

pub fn slot_id(prompt: &str) -> anyhow::Result<SlotId> {
    ask(prompt, SLOT_ID_HINT, |s| normalise(s).parse().ok())
}

pub fn registration(prompt: &str) -> anyhow::Result<Registration> {
    ask(prompt, REGISTRATION_HINT, |s| normalise(s).parse().ok())
}

pub fn yes_no(prompt: &str) -> anyhow::Result<bool> {
    ask(prompt, "Enter 'y' or 'n'", parse_yes_no)
}

pub fn slot_count(prompt: &str) -> anyhow::Result<usize> {
    let hint = format!("Enter a number between 1 and {MAX_SLOTS_PER_CATEGORY}");
    ask(prompt, &hint, parse_slot_count)
}

pub fn owner_name(prompt: &str) -> anyhow::Result<NonEmptyString> {
    ask(prompt, "Owner name cannot be empty", |s| {
        NonEmptyString::new(s.trim().to_string()).ok()
    })
}

pub fn menu_choice() -> anyhow::Result<MenuChoice> {
    ask("Select option (1-9)", "Enter 1-9", MenuChoice::parse)
}

pub fn pause() -> anyhow::Result<()> {
    Input::<String>::new()
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}
