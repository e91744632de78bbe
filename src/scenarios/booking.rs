//! End-to-end booking scenario
//!
//! Login, provider setup, availability configuration, patient registration,
//! appointment booking with slot selection and a final listing check, in
//! strict order. Every navigation and save is followed by a network-quiet
//! wait; the only fixed pauses left are typeahead debounces after search
//! fills, where the request the quiet wait would watch has not started yet.

use crate::config::HarnessConfig;
use crate::data::SeedData;
use crate::scenarios::selectors;
use element_locator::{Locator, LocatorChain};
use flow_runner::{Action, Flow, Step};

/// Settle time the portal's search boxes need before firing a request.
const SEARCH_DEBOUNCE_MS: u64 = 1_000;

/// Deadline for the final listing assertions.
const LISTING_TIMEOUT_MS: u64 = 10_000;

/// Builds the complete booking flow for one seeded run.
pub fn booking_flow(config: &HarnessConfig, seed: &SeedData) -> Flow {
    let mut flow = Flow::new("booking")
        .with_description("Login, provider setup, patient registration and appointment booking")
        .with_timeout(config.timeouts.flow_ms);

    flow = login_steps(flow, config);
    flow = onboarding_steps(flow);
    flow = provider_steps(flow, seed);
    flow = availability_steps(flow, seed);
    flow = patient_steps(flow, seed);
    flow = appointment_steps(flow, seed);
    verification_steps(flow, seed)
}

fn login_steps(flow: Flow, config: &HarnessConfig) -> Flow {
    flow.step(Step::new(
        "nav.portal",
        "Open the portal",
        Action::Navigate {
            url: config.base_url.to_string(),
        },
    ))
    .step(Step::new(
        "nav.settle",
        "Wait for the login screen",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "login.email",
        "Fill login email",
        Action::Fill {
            target: selectors::email_input(),
            value: config.credentials.email.clone(),
        },
    ))
    .step(Step::new(
        "login.password",
        "Fill login password",
        Action::Fill {
            target: selectors::password_input(),
            value: config.credentials.password.clone(),
        },
    ))
    .step(Step::new(
        "login.submit",
        "Submit the login form",
        Action::Click {
            target: selectors::sign_in_button(),
        },
    ))
    .step(Step::new(
        "login.settle",
        "Wait for the dashboard",
        Action::WaitNetworkQuiet,
    ))
}

fn onboarding_steps(flow: Flow) -> Flow {
    flow.step(
        Step::new(
            "onboarding.dismiss",
            "Dismiss the getting-started prompt when shown",
            Action::Click {
                target: selectors::get_started_button(),
            },
        )
        .optional(),
    )
    .step(Step::new(
        "onboarding.settle",
        "Let the dashboard settle",
        Action::WaitNetworkQuiet,
    ))
}

fn provider_steps(flow: Flow, seed: &SeedData) -> Flow {
    flow.step(Step::new(
        "settings.create-menu",
        "Open the Create menu",
        Action::Click {
            target: selectors::create_menu(),
        },
    ))
    .step(Step::new(
        "settings.open",
        "Open Settings",
        Action::Click {
            target: selectors::settings_item(),
        },
    ))
    .step(Step::new(
        "settings.settle",
        "Wait for the settings screen",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "settings.user-settings",
        "Open User Settings",
        Action::Click {
            target: selectors::user_settings_item(),
        },
    ))
    .step(Step::new(
        "settings.user-settings-settle",
        "Wait for user settings",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "settings.providers-tab",
        "Open the Providers tab",
        Action::Click {
            target: selectors::providers_tab(),
        },
    ))
    .step(Step::new(
        "settings.providers-settle",
        "Wait for the provider list",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "provider.add",
        "Start adding a provider user",
        Action::Click {
            target: selectors::add_provider_button(),
        },
    ))
    .step(Step::new(
        "provider.form-settle",
        "Wait for the provider form",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "provider.first-name",
        "Fill provider first name",
        Action::Fill {
            target: selectors::first_name_input(),
            value: seed.provider.first_name.clone(),
        },
    ))
    .step(Step::new(
        "provider.last-name",
        "Fill provider last name",
        Action::Fill {
            target: selectors::last_name_input(),
            value: seed.provider.last_name.clone(),
        },
    ))
    .step(Step::new(
        "provider.role-open",
        "Open the role dropdown",
        Action::Click {
            target: selectors::role_dropdown(),
        },
    ))
    .step(Step::new(
        "provider.role-option",
        "Choose the provider role",
        Action::Click {
            target: selectors::option_text(&seed.provider.role),
        },
    ))
    .step(Step::new(
        "provider.email",
        "Fill provider email",
        Action::Fill {
            target: selectors::form_email_input(),
            value: seed.provider.email.clone(),
        },
    ))
    .step(Step::new(
        "provider.gender-open",
        "Open the gender dropdown",
        Action::Click {
            target: selectors::gender_dropdown(),
        },
    ))
    .step(Step::new(
        "provider.gender-option",
        "Choose the provider gender",
        Action::Click {
            target: selectors::option_text(&seed.provider.gender),
        },
    ))
    .step(Step::new(
        "provider.save",
        "Save the provider",
        Action::Click {
            target: selectors::save_button(),
        },
    ))
    .step(Step::new(
        "provider.save-settle",
        "Wait for the provider to be saved",
        Action::WaitNetworkQuiet,
    ))
}

fn availability_steps(flow: Flow, seed: &SeedData) -> Flow {
    let mut flow = flow
        .step(Step::new(
            "availability.scheduling-menu",
            "Open the Scheduling menu",
            Action::Click {
                target: selectors::scheduling_menu(),
            },
        ))
        .step(Step::new(
            "availability.open",
            "Open Availability",
            Action::Click {
                target: selectors::availability_item(),
            },
        ))
        .step(Step::new(
            "availability.settle",
            "Wait for the availability screen",
            Action::WaitNetworkQuiet,
        ))
        .step(Step::new(
            "availability.edit",
            "Start editing availability",
            Action::Click {
                target: selectors::edit_availability_button(),
            },
        ))
        .step(Step::new(
            "availability.edit-settle",
            "Wait for the availability form",
            Action::WaitNetworkQuiet,
        ))
        .step(Step::new(
            "availability.provider-open",
            "Open the provider picker",
            Action::Click {
                target: selectors::provider_picker(),
            },
        ))
        .step(Step::new(
            "availability.provider-search",
            "Search for the provider",
            Action::Fill {
                target: selectors::provider_search_input(),
                value: seed.availability.provider_name.clone(),
            },
        ))
        .step(Step::new(
            "availability.provider-debounce",
            "Let the provider search settle",
            Action::Pause {
                ms: SEARCH_DEBOUNCE_MS,
            },
        ))
        .step(Step::new(
            "availability.provider-option",
            "Pick the provider from the results",
            Action::Click {
                target: selectors::search_result(&seed.availability.provider_name),
            },
        ))
        .step(Step::new(
            "availability.timezone-open",
            "Open the time zone dropdown",
            Action::Click {
                target: selectors::timezone_dropdown(),
            },
        ))
        .step(Step::new(
            "availability.timezone-option",
            "Choose the time zone",
            Action::Click {
                target: selectors::option_text(&seed.availability.time_zone),
            },
        ))
        .step(Step::new(
            "availability.booking-window",
            "Fill the booking window",
            Action::Fill {
                target: selectors::booking_window_input(),
                value: seed.availability.booking_window.clone(),
            },
        ))
        .step(Step::new(
            "availability.booking-window-unit",
            "Choose the booking window unit",
            Action::Click {
                target: selectors::option_text(&seed.availability.booking_window_unit),
            },
        ));

    if seed.availability.set_to_weekdays {
        flow = flow.step(Step::new(
            "availability.weekdays",
            "Enable the weekday template",
            Action::Click {
                target: selectors::weekdays_toggle(),
            },
        ));
    }

    flow.step(Step::new(
        "availability.start-time",
        "Fill the day start time",
        Action::Fill {
            target: selectors::start_time_input(),
            value: seed.availability.start_time.clone(),
        },
    ))
    .step(Step::new(
        "availability.end-time",
        "Fill the day end time",
        Action::Fill {
            target: selectors::end_time_input(),
            value: seed.availability.end_time.clone(),
        },
    ))
    .step(Step::new(
        "availability.save",
        "Save the availability",
        Action::Click {
            target: selectors::save_button(),
        },
    ))
    .step(Step::new(
        "availability.save-settle",
        "Wait for the availability to be saved",
        Action::WaitNetworkQuiet,
    ))
}

fn patient_steps(flow: Flow, seed: &SeedData) -> Flow {
    flow.step(Step::new(
        "patient.create-menu",
        "Open the Create menu",
        Action::Click {
            target: selectors::create_menu(),
        },
    ))
    .step(Step::new(
        "patient.new",
        "Open New Patient",
        Action::Click {
            target: selectors::new_patient_item(),
        },
    ))
    .step(Step::new(
        "patient.settle",
        "Wait for the patient screen",
        Action::WaitNetworkQuiet,
    ))
    .step(
        Step::new(
            "patient.details",
            "Enter patient details when the chooser is shown",
            Action::Click {
                target: selectors::enter_patient_details_button(),
            },
        )
        .optional(),
    )
    .step(
        Step::new(
            "patient.next",
            "Advance past the intro step when shown",
            Action::Click {
                target: selectors::next_button(),
            },
        )
        .optional(),
    )
    .step(Step::new(
        "patient.first-name",
        "Fill patient first name",
        Action::Fill {
            target: selectors::first_name_input(),
            value: seed.patient.first_name.clone(),
        },
    ))
    .step(Step::new(
        "patient.last-name",
        "Fill patient last name",
        Action::Fill {
            target: selectors::last_name_input(),
            value: seed.patient.last_name.clone(),
        },
    ))
    .step(Step::new(
        "patient.dob",
        "Fill patient date of birth",
        Action::Fill {
            target: selectors::date_of_birth_input(),
            value: seed.patient.date_of_birth.clone(),
        },
    ))
    .step(Step::new(
        "patient.gender-open",
        "Open the gender dropdown",
        Action::Click {
            target: selectors::gender_dropdown(),
        },
    ))
    .step(Step::new(
        "patient.gender-option",
        "Choose the patient gender",
        Action::Click {
            target: selectors::option_text(&seed.patient.gender),
        },
    ))
    .step(Step::new(
        "patient.mobile",
        "Fill patient mobile number",
        Action::Fill {
            target: selectors::mobile_input(),
            value: seed.patient.mobile.clone(),
        },
    ))
    .step(Step::new(
        "patient.email",
        "Fill patient email",
        Action::Fill {
            target: selectors::form_email_input(),
            value: seed.patient.email.clone(),
        },
    ))
    .step(Step::new(
        "patient.save",
        "Save the patient",
        Action::Click {
            target: selectors::save_button(),
        },
    ))
    .step(Step::new(
        "patient.save-settle",
        "Wait for the patient to be saved",
        Action::WaitNetworkQuiet,
    ))
}

fn appointment_steps(flow: Flow, seed: &SeedData) -> Flow {
    flow.step(Step::new(
        "appointment.create-menu",
        "Open the Create menu",
        Action::Click {
            target: selectors::create_menu(),
        },
    ))
    .step(Step::new(
        "appointment.new",
        "Open New Appointment",
        Action::Click {
            target: selectors::new_appointment_item(),
        },
    ))
    .step(Step::new(
        "appointment.settle",
        "Wait for the appointment form",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "appointment.patient-search",
        "Search for the patient",
        Action::Fill {
            target: selectors::patient_search_input(),
            value: seed.appointment.patient_name.clone(),
        },
    ))
    .step(Step::new(
        "appointment.patient-debounce",
        "Let the patient search settle",
        Action::Pause {
            ms: SEARCH_DEBOUNCE_MS,
        },
    ))
    .step(Step::new(
        "appointment.patient-option",
        "Pick the patient from the results",
        Action::Click {
            target: selectors::search_result(&seed.appointment.patient_name),
        },
    ))
    .step(Step::new(
        "appointment.type-open",
        "Open the appointment type dropdown",
        Action::Click {
            target: selectors::appointment_type_dropdown(),
        },
    ))
    .step(Step::new(
        "appointment.type-option",
        "Choose the appointment type",
        Action::Click {
            target: selectors::option_text(&seed.appointment.appointment_type),
        },
    ))
    .step(Step::new(
        "appointment.reason",
        "Fill the reason for visit",
        Action::Fill {
            target: selectors::reason_input(),
            value: seed.appointment.reason_for_visit.clone(),
        },
    ))
    .step(Step::new(
        "appointment.timezone-open",
        "Open the time zone dropdown",
        Action::Click {
            target: selectors::timezone_dropdown(),
        },
    ))
    .step(Step::new(
        "appointment.timezone-option",
        "Choose the time zone",
        Action::Click {
            target: selectors::option_text(&seed.appointment.time_zone),
        },
    ))
    .step(Step::new(
        "appointment.visit-type-open",
        "Open the visit type dropdown",
        Action::Click {
            target: selectors::visit_type_dropdown(),
        },
    ))
    .step(Step::new(
        "appointment.visit-type-option",
        "Choose the visit type",
        Action::Click {
            target: selectors::option_text(&seed.appointment.visit_type),
        },
    ))
    .step(Step::new(
        "appointment.provider-open",
        "Open the provider picker",
        Action::Click {
            target: selectors::provider_picker(),
        },
    ))
    .step(Step::new(
        "appointment.provider-search",
        "Search for the provider",
        Action::Fill {
            target: selectors::provider_search_input(),
            value: seed.appointment.provider_name.clone(),
        },
    ))
    .step(Step::new(
        "appointment.provider-debounce",
        "Let the provider search settle",
        Action::Pause {
            ms: SEARCH_DEBOUNCE_MS,
        },
    ))
    .step(Step::new(
        "appointment.provider-option",
        "Pick the provider from the results",
        Action::Click {
            target: selectors::search_result(&seed.appointment.provider_name),
        },
    ))
    .step(Step::new(
        "appointment.view-availability",
        "View the provider's availability",
        Action::Click {
            target: selectors::view_availability_button(),
        },
    ))
    .step(Step::new(
        "appointment.slots-settle",
        "Wait for the slot grid",
        Action::WaitNetworkQuiet,
    ))
    .step(Step::new(
        "appointment.slot",
        "Pick the first open slot",
        Action::Click {
            target: selectors::open_slot(),
        },
    ))
    .step(Step::new(
        "appointment.save",
        "Save and close the appointment",
        Action::Click {
            target: selectors::save_and_close_button(),
        },
    ))
    .step(Step::new(
        "appointment.save-settle",
        "Wait for the appointment to be saved",
        Action::WaitNetworkQuiet,
    ))
}

fn verification_steps(flow: Flow, seed: &SeedData) -> Flow {
    flow.step(Step::new(
        "verify.scheduling-menu",
        "Open the Scheduling menu",
        Action::Click {
            target: selectors::scheduling_menu(),
        },
    ))
    .step(Step::new(
        "verify.appointments",
        "Open Appointments",
        Action::Click {
            target: selectors::appointments_item(),
        },
    ))
    .step(Step::new(
        "verify.settle",
        "Wait for the appointments listing",
        Action::WaitNetworkQuiet,
    ))
    .step(
        Step::new(
            "verify.listing.first",
            "Listing shows the patient's first name",
            Action::ExpectVisible {
                target: LocatorChain::new(Locator::text(&seed.patient.first_name)),
            },
        )
        .with_timeout_ms(LISTING_TIMEOUT_MS),
    )
    .step(
        Step::new(
            "verify.listing.last",
            "Listing shows the patient's last name",
            Action::ExpectVisible {
                target: LocatorChain::new(Locator::text(&seed.patient.last_name)),
            },
        )
        .with_timeout_ms(LISTING_TIMEOUT_MS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataProfile, SeedData};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn sample_flow() -> Flow {
        booking_flow(&HarnessConfig::default(), &SeedData::smoke())
    }

    fn position(flow: &Flow, id: &str) -> usize {
        flow.steps
            .iter()
            .position(|s| s.id == id)
            .unwrap_or_else(|| panic!("missing step {id}"))
    }

    #[test]
    fn test_sections_run_in_portal_order() {
        let flow = sample_flow();
        assert_eq!(flow.steps[0].id, "nav.portal");
        assert!(position(&flow, "login.submit") < position(&flow, "onboarding.dismiss"));
        assert!(position(&flow, "provider.save") < position(&flow, "availability.edit"));
        assert!(position(&flow, "availability.save") < position(&flow, "patient.first-name"));
        assert!(position(&flow, "patient.save") < position(&flow, "appointment.slot"));
        assert!(position(&flow, "appointment.save") < position(&flow, "verify.listing.first"));
        assert_eq!(flow.steps.last().unwrap().id, "verify.listing.last");
    }

    #[test]
    fn test_step_ids_are_unique() {
        let flow = sample_flow();
        let mut seen = HashSet::new();
        for step in &flow.steps {
            assert!(seen.insert(step.id.clone()), "duplicate id {}", step.id);
        }
    }

    #[test]
    fn test_onboarding_and_patient_chooser_are_optional() {
        let flow = sample_flow();
        let optional: Vec<&str> = flow
            .steps
            .iter()
            .filter(|s| s.optional)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(optional, ["onboarding.dismiss", "patient.details", "patient.next"]);
    }

    #[test]
    fn test_fixed_pauses_only_guard_search_debounce() {
        let flow = sample_flow();
        let pauses: Vec<&Step> = flow
            .steps
            .iter()
            .filter(|s| matches!(s.action, Action::Pause { .. }))
            .collect();

        assert_eq!(pauses.len(), 3);
        for step in pauses {
            assert!(step.id.ends_with("-debounce"), "unexpected pause {}", step.id);
            assert!(matches!(step.action, Action::Pause { ms } if ms == SEARCH_DEBOUNCE_MS));
            let before = position(&flow, &step.id) - 1;
            assert!(matches!(flow.steps[before].action, Action::Fill { .. }));
        }
    }

    #[test]
    fn test_weekday_template_follows_the_seed() {
        let flow = sample_flow();
        assert!(
            position(&flow, "availability.weekdays")
                < position(&flow, "availability.start-time")
        );

        let mut seed = SeedData::smoke();
        seed.availability.set_to_weekdays = false;
        let flow = booking_flow(&HarnessConfig::default(), &seed);
        assert!(!flow.steps.iter().any(|s| s.id == "availability.weekdays"));
    }

    #[test]
    fn test_saves_are_followed_by_quiet_waits() {
        let flow = sample_flow();
        for id in [
            "provider.save",
            "availability.save",
            "patient.save",
            "appointment.save",
        ] {
            let next = &flow.steps[position(&flow, id) + 1];
            assert!(
                matches!(next.action, Action::WaitNetworkQuiet),
                "{id} not followed by a quiet wait"
            );
        }
    }

    #[test]
    fn test_verification_asserts_both_patient_names() {
        let flow = sample_flow();
        let first = &flow.steps[position(&flow, "verify.listing.first")];
        let last = &flow.steps[position(&flow, "verify.listing.last")];

        assert_eq!(first.timeout_ms, Some(LISTING_TIMEOUT_MS));
        match &first.action {
            Action::ExpectVisible { target } => {
                assert_eq!(target.to_string(), "text:'pavan'");
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &last.action {
            Action::ExpectVisible { target } => {
                assert_eq!(target.to_string(), "text:'Ingale'");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_random_seed_threads_generated_provider_through() {
        let seed = SeedData::random(&mut StdRng::seed_from_u64(11));
        let flow = booking_flow(&HarnessConfig::default(), &seed);

        let search = &flow.steps[position(&flow, "availability.provider-search")];
        match &search.action {
            Action::Fill { value, .. } => assert_eq!(value, &seed.provider.display_name()),
            other => panic!("unexpected action {other:?}"),
        }

        let option = &flow.steps[position(&flow, "appointment.provider-option")];
        match &option.action {
            Action::Click { target } => {
                assert!(target.to_string().contains(&seed.provider.display_name()));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_generate_covers_both_profiles() {
        let smoke = booking_flow(&HarnessConfig::default(), &SeedData::generate(DataProfile::Smoke));
        assert_eq!(smoke.name, "booking");
        assert!(smoke.steps.len() > 70);

        let regression = booking_flow(
            &HarnessConfig::default(),
            &SeedData::generate(DataProfile::Regression),
        );
        assert_eq!(regression.steps.len(), smoke.steps.len());
    }
}
