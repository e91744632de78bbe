//! Locator chains for the portal's controls.
//!
//! Each chain lists strategies in preference order: a stable attribute
//! selector first, then text or role fallbacks that survive markup churn.
//! The portal renders its dropdowns as custom comboboxes, so selection is
//! modeled as a trigger click followed by an option click.

use element_locator::{Locator, LocatorChain};

// Login screen

pub fn email_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[type=\"email\"]"))
        .or(Locator::css("input[name=\"email\"]"))
        .or(Locator::css("input[id*=\"email\"]"))
}

pub fn password_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[type=\"password\"]"))
        .or(Locator::css("input[name=\"password\"]"))
        .or(Locator::css("input[id*=\"password\"]"))
}

pub fn sign_in_button() -> LocatorChain {
    LocatorChain::new(Locator::css("button[type=\"submit\"]"))
        .or(Locator::role_named("button", "Login"))
        .or(Locator::role_named("button", "Sign in"))
}

pub fn get_started_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Let's Get Started"))
        .or(Locator::role_named("button", "Get Started"))
        .or(Locator::text("Get Started"))
}

// Top navigation

pub fn create_menu() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Create"))
        .or(Locator::role_named("button", "Create"))
        .or(Locator::role_named("link", "Create"))
}

pub fn scheduling_menu() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Scheduling"))
        .or(Locator::role_named("button", "Scheduling"))
        .or(Locator::role_named("link", "Scheduling"))
}

pub fn settings_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Settings"))
}

pub fn user_settings_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("User Settings"))
}

pub fn new_patient_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("New Patient"))
}

pub fn new_appointment_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("New Appointment"))
}

pub fn availability_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Availability"))
}

pub fn appointments_item() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Appointments"))
}

// User settings screen

pub fn providers_tab() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Providers"))
        .or(Locator::role_named("tab", "Providers"))
        .or(Locator::role_named("button", "Providers"))
}

pub fn add_provider_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Add Provider User"))
        .or(Locator::role_named("button", "Add Provider"))
        .or(Locator::text("+ Provider"))
}

// Form fields shared by the provider and patient screens

pub fn first_name_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name=\"firstName\"]"))
        .or(Locator::css("input[placeholder*=\"First Name\"]"))
}

pub fn last_name_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name=\"lastName\"]"))
        .or(Locator::css("input[placeholder*=\"Last Name\"]"))
}

pub fn form_email_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name=\"email\"]"))
        .or(Locator::css("input[type=\"email\"]:not([disabled])"))
}

pub fn date_of_birth_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name*=\"dateOfBirth\"]"))
        .or(Locator::css("input[placeholder*=\"Date of Birth\"]"))
        .or(Locator::css("input[type=\"date\"]"))
}

pub fn mobile_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name*=\"mobile\"]"))
        .or(Locator::css("input[name*=\"phone\"]"))
        .or(Locator::css("input[placeholder*=\"Mobile\"]"))
        .or(Locator::css("input[placeholder*=\"Phone\"]"))
}

pub fn role_dropdown() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Role"))
        .or(Locator::css("select[name=\"role\"]"))
        .or(Locator::css("input[placeholder*=\"Role\"]"))
}

pub fn gender_dropdown() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Gender"))
        .or(Locator::css("select[name=\"gender\"]"))
        .or(Locator::css("select[id*=\"gender\"]"))
}

pub fn save_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Save")).or(Locator::text_exact("Save"))
}

// Availability screen

pub fn edit_availability_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Edit Availability"))
        .or(Locator::text_exact("Edit Availability"))
        .or(Locator::role_named("button", "Edit"))
}

pub fn provider_picker() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Provider"))
        .or(Locator::css("input[placeholder*=\"Provider\"]"))
}

pub fn provider_search_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[placeholder=\"Search provider\"]"))
        .or(Locator::css("input[placeholder*=\"Search\"]"))
}

pub fn timezone_dropdown() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Time Zone"))
        .or(Locator::css("select[name*=\"timezone\"]"))
        .or(Locator::css("input[placeholder*=\"Time Zone\"]"))
}

pub fn booking_window_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name*=\"bookingWindow\"]"))
        .or(Locator::css("input[placeholder*=\"Booking Window\"]"))
}

pub fn weekdays_toggle() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Set to Weekdays"))
        .or(Locator::role_named("checkbox", "Set to Weekdays"))
}

pub fn start_time_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name*=\"startTime\"]"))
        .or(Locator::css("input[placeholder*=\"Start Time\"]"))
}

pub fn end_time_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name*=\"endTime\"]"))
        .or(Locator::css("input[placeholder*=\"End Time\"]"))
}

// Patient registration screen

pub fn enter_patient_details_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Enter Patient Details"))
        .or(Locator::text("Enter Patient Details"))
}

pub fn next_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Next")).or(Locator::text_exact("Next"))
}

// Appointment screen

pub fn patient_search_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[placeholder=\"Search patient\"]"))
        .or(Locator::css("input[placeholder*=\"Patient\"]"))
        .or(Locator::css("input[placeholder*=\"Search\"]"))
}

pub fn appointment_type_dropdown() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Appointment Type"))
        .or(Locator::css("select[name*=\"appointmentType\"]"))
        .or(Locator::css("input[placeholder*=\"Appointment Type\"]"))
}

pub fn reason_input() -> LocatorChain {
    LocatorChain::new(Locator::css("input[name=\"reasonForVisit\"]"))
        .or(Locator::css("input[name*=\"reason\"]"))
        .or(Locator::css("textarea[name*=\"reason\"]"))
        .or(Locator::css("input[placeholder*=\"Reason\"]"))
}

pub fn visit_type_dropdown() -> LocatorChain {
    LocatorChain::new(Locator::text_exact("Select Visit Type"))
        .or(Locator::css("select[name*=\"visitType\"]"))
        .or(Locator::css("input[placeholder*=\"Visit Type\"]"))
}

pub fn view_availability_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "View Availability"))
        .or(Locator::text("View Availability"))
}

pub fn open_slot() -> LocatorChain {
    LocatorChain::new(Locator::css(".available-slot"))
        .or(Locator::css("button.time-slot:not([disabled])"))
        .or(Locator::css("div.available-time"))
}

pub fn save_and_close_button() -> LocatorChain {
    LocatorChain::new(Locator::role_named("button", "Save and Close"))
        .or(Locator::role_named("button", "Save & Close"))
        .or(Locator::role_named("button", "Save"))
}

// Dynamic targets

/// Dropdown entry carrying exactly the given label.
pub fn option_text(label: &str) -> LocatorChain {
    LocatorChain::new(Locator::text_exact(label)).or(Locator::role_named("option", label))
}

/// Typeahead result row for a previously entered name. Rows often carry
/// extra columns, so a substring match backs up the exact one.
pub fn search_result(name: &str) -> LocatorChain {
    LocatorChain::new(Locator::text_exact(name)).or(Locator::text(name))
}
